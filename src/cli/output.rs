//! CLI output: error mapping from domain errors to a stable CLI surface.

use crate::error::ApiError;

/// `<kind>: <message>` so scripts can match on the leading category.
pub fn map_error(e: &ApiError) -> String {
    format!("{}: {}", e.kind(), e)
}
