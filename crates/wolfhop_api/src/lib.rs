//! Transport-agnostic HTTP surface for WolfHop.
//!
//! # Responsibility
//! - Route method + path pairs to core services.
//! - Convert wire JSON to domain inputs and domain records to wire JSON.
//! - Map service failures to status codes with a `{"detail": ...}` body.
//!
//! # Invariants
//! - Nothing here opens sockets; callers hand in fully-read requests.
//! - Password hashes never appear in a response body.

pub mod dto;
pub mod request;
mod router;

pub use request::{ApiRequest, ApiResponse, Method};
pub use router::{Api, ApiError, API_PREFIX};
