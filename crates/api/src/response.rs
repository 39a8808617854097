//! Shared response envelope types for API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` envelope for list responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
