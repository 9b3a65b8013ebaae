//! Cloud-native HTTP service backed by MongoDB.
//!
//! # Architecture Overview
//!
//! ```text
//!     process start
//!         │
//!         ├─▶ config      (defaults → CLOUDNATIVE_CONFIG file → MONGO_URI)
//!         ├─▶ observability (tracing subscriber, optional Prometheus)
//!         │
//!         ├─▶ datastore   one background connection attempt ──▶ watch channel
//!         │                                                        │
//!         └─▶ lifecycle   bind :3000 → http server ◀── AppState ───┘
//!                              │
//!                              ├─ GET /        static greeting
//!                              └─ GET /health  datastore status
//! ```
//!
//! The server never waits for the datastore; handlers that need it call
//! [`datastore::Datastore::wait_ready`] with their own timeout.

pub mod config;
pub mod datastore;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use datastore::{Datastore, MongoConnector, MongoHandle};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
