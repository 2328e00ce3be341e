//! Shared helpers for end-to-end tests.
//!
//! Each test spawns an isolated server with its own temporary database and,
//! when external metadata matters, mock upstream services on loopback.
#![allow(dead_code)] // Not every test binary uses every helper.

pub mod client;
pub mod mock_upstream;
pub mod server;

pub use client::TestClient;
pub use mock_upstream::MockUpstream;
pub use server::TestServer;
