//! Copperleaf Delivery library.
//!
//! This crate provides the download server's functionality as a library,
//! allowing it to be tested and reused by the CLI (which mints the same
//! signed URLs the server verifies).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod signed_url;
pub mod state;
