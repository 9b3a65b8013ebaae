//! Datastore subsystem.
//!
//! # Data Flow
//! ```text
//! DatastoreConfig.uri (MONGO_URI or default)
//!     → connector.rs (spawn one attempt, publish outcome on a watch channel)
//!     → mongo.rs (parse URI, build client, ping)
//!     → Datastore<MongoHandle> shared through AppState
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt per process; failures are logged, never retried
//! - Startup never waits on the attempt
//! - Callers that need the database await `wait_ready` with their own timeout

pub mod connector;
pub mod mongo;
pub mod types;

pub use connector::{Connector, Datastore};
pub use mongo::{MongoConnector, MongoHandle};
pub use types::{redact_uri, ConnectionState, ConnectionStatus, DatastoreError, DatastoreResult};
