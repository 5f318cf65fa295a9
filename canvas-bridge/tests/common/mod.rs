//! Shared helpers for bridge integration tests.

pub mod server;

pub use server::TestServer;
