use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::shared::constants::MAX_PAGE_SIZE;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    /// Machine-readable error kind, e.g. `NOT_FOUND`
    #[schema(example = "NOT_FOUND")]
    pub code: String,
    pub message: String,
    pub errors: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: String, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            code: code.to_string(),
            message,
            errors,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Optional limit/offset query parameters for list endpoints.
/// Omitting `limit` returns every row.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Maximum number of items to return (1-1000)
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    #[param(minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,

    /// Number of items to skip (default: 0)
    #[validate(range(min = 0, message = "offset must not be negative"))]
    #[param(minimum = 0)]
    pub offset: Option<i64>,
}

impl PaginationQuery {
    /// SQL OFFSET, defaulting to 0
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// SQL LIMIT, or `None` for no limit
    pub fn limit(&self) -> Option<i64> {
        self.limit.map(|l| l.clamp(1, MAX_PAGE_SIZE))
    }
}
