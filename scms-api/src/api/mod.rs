//! HTTP API handlers for scms-api

pub mod buildinfo;
pub mod collections;
pub mod health;
pub mod pages;
pub mod sections;
pub mod uploads;

pub use buildinfo::get_build_info;
pub use collections::collection_routes;
pub use health::health_routes;
pub use pages::page_routes;
pub use sections::section_routes;
pub use uploads::upload_routes;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Record ids in paths; anything that is not a UUID cannot exist
pub(crate) fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound(format!("No record with id {}", id)))
}
