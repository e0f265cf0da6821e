//! CLI command implementations.

pub mod link;
pub mod migrate;
pub mod verify;
