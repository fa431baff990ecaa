/*
 * Pagegraph Server - RPC Surface for the Wiki Core
 *
 * Transport-neutral service layer:
 * - status   : error-code vocabulary (the core's taxonomy, mapped once)
 * - server   : dependency struct + construction validation
 * - services : SystemInfo / Frontmatter / PageManagement / Search / Inventory
 * - jobs     : FIFO queues, per-queue workers, status snapshots + streaming
 *
 * Framing, auth, and identity extraction live outside; handlers are
 * plain async methods over serde-ready request/response structs.
 */

pub mod jobs;
pub mod server;
pub mod services;
pub mod status;

pub use jobs::{FnJob, Job, JobCoordinator, JobQueue, QueueStatus};
pub use server::{init_logging, Dependencies, WikiServer};
pub use status::{RpcResult, Status, StatusCode};
