//! Solver Common - shared types for the assignment answering service.
//!
//! Holds the classifier's structured analysis contract, the command
//! allow-list, and the wire types of the inbound API.

pub mod allowlist;
pub mod intent;
pub mod rpc;

pub use allowlist::*;
pub use intent::*;
pub use rpc::*;
