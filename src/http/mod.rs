//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → json.rs (JSON body parsing)
//!     → handlers.rs (GET /, GET /health)
//!     → response.rs (error rendering)
//!     → Send to client
//! ```

pub mod handlers;
pub mod json;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::{HealthReport, GREETING};
pub use json::JsonBody;
pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer};
