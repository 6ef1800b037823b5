//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeUpstream, TestClient, TestServer};
//!
//! #[tokio::test]
//! async fn test_platforms() {
//!     let upstream = FakeUpstream::healthy().await;
//!     let server = TestServer::spawn(upstream.sources()).await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.list_platforms().await;
//!     assert!(response.status().is_success());
//! }
//! ```

mod client;
mod constants;
mod server;
mod upstream;

pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;
pub use upstream::FakeUpstream;
