//! RPC services
//!
//! One module per service, matching the RPC surface. Handlers are
//! plain async methods over request/response structs; transport
//! framing, auth, and identity extraction live outside this crate.
//! Peer cancellation is honored by future-dropping: every handler
//! suspends only at store and index awaits, so a dropped call aborts
//! at its next suspension point. The streaming job-status handler
//! additionally takes an explicit cancellation token because its
//! lifetime outlives a single request/response exchange.

pub mod frontmatter;
pub mod inventory;
pub mod page_management;
pub mod search;
pub mod system_info;
