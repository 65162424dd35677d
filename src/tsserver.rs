//! Bridge to a TypeScript `tsserver` process.
//!
//! - `protocol`: request and response types
//! - `connection`: process spawning and message framing
//! - `router`: maps responses to waiting requests by sequence number
//! - `reader`: background task draining tsserver's stdout
//! - `client`: the connection used by the rest of the crate
//! - `handle`: the currently running connection, replaceable at runtime

pub mod client;
pub mod connection;
pub mod handle;
pub mod protocol;
pub mod reader;
pub mod router;

pub use client::TsServerClient;
pub use handle::TsServerHandle;
pub use router::ResponseRouter;
