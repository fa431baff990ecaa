//! SystemInfo service: version, job status, and streamed job status.

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;

use crate::jobs::{JobCoordinator, QueueStatus};
use crate::status::{RpcResult, Status};

/// Server-enforced floor for the streaming interval.
const MIN_INTERVAL_MS: u64 = 100;
const DEFAULT_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub commit: String,
    pub build_time: String,
    /// Opaque identity fields, echoed only when the transport supplied
    /// them at construction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub queues: Vec<QueueStatus>,
}

pub struct SystemInfoService {
    version: VersionInfo,
    coordinator: Option<Arc<JobCoordinator>>,
}

impl SystemInfoService {
    pub fn new(version: VersionInfo, coordinator: Option<Arc<JobCoordinator>>) -> Self {
        Self {
            version,
            coordinator,
        }
    }

    pub fn get_version(&self) -> VersionInfo {
        self.version.clone()
    }

    pub fn get_job_status(&self) -> RpcResult<JobStatusResponse> {
        let coordinator = self.require_coordinator()?;
        Ok(JobStatusResponse {
            queues: coordinator.snapshot(),
        })
    }

    /// Server-streamed job status snapshots on a ticker. The interval
    /// defaults to 1 s and is clamped to a 100 ms floor; the stream
    /// ends when the peer's token fires.
    pub fn stream_job_status(
        &self,
        update_interval_ms: u64,
        cancel: CancellationToken,
    ) -> RpcResult<impl Stream<Item = JobStatusResponse> + Send + 'static> {
        let coordinator = self.require_coordinator()?;
        let millis = if update_interval_ms == 0 {
            DEFAULT_INTERVAL_MS
        } else {
            update_interval_ms.max(MIN_INTERVAL_MS)
        };
        let interval = tokio::time::interval(Duration::from_millis(millis));
        let stream = IntervalStream::new(interval)
            .map(move |_| JobStatusResponse {
                queues: coordinator.snapshot(),
            })
            .take_until(cancel.cancelled_owned());
        Ok(stream)
    }

    fn require_coordinator(&self) -> RpcResult<Arc<JobCoordinator>> {
        self.coordinator
            .clone()
            .ok_or_else(|| Status::unavailable("job coordinator is not wired"))
    }
}
