pub mod convert;
pub mod error;
pub mod formats;
pub mod graph;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod search;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
