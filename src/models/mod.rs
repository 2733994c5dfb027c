//! Models for the caching proxy
//!
//! The buffered response type shared by the cache and the origin client, and
//! the DTOs served by the administrative endpoints.

pub mod requests;
pub mod responses;
pub mod snapshot;

// Re-export commonly used types
pub use requests::InvalidateParams;
pub use responses::{
    ClearResponse, ErrorResponse, HealthResponse, InvalidateResponse, StatsResponse,
};
pub use snapshot::ResponseSnapshot;
