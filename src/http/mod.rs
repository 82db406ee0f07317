//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, edge view of the request)
//!     → edge handler decides
//!     → response.rs (redirect / denial / error)  or  origin forward
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{edge_request, UuidRequestId, X_REQUEST_ID};
pub use response::EdgeResponse;
pub use server::{AppState, HttpServer, ServiceState};
