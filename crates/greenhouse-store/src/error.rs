//! Store errors.

use greenhouse_core::ApiError;
use thiserror::Error;

/// Errors returned by a [`Store`](crate::Store).
#[derive(Debug, Error)]
pub enum StoreError {
    /// No plant has the requested id.
    #[error("plant with ID '{id}' does not exist")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The backing storage failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Classifies the error for the HTTP layer and prefixes `operation`.
    ///
    /// Not-found becomes a 404; anything else is internal.
    #[must_use]
    pub fn into_api_error(self, operation: &str) -> ApiError {
        let message = self.to_string();
        let err = if self.is_not_found() {
            ApiError::not_found(message)
        } else {
            ApiError::internal(message)
        };
        err.context(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::NotFound { id: "7".to_string() };
        assert_eq!(err.to_string(), "plant with ID '7' does not exist");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = StoreError::NotFound { id: "7".to_string() }.into_api_error("find plant by id");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.message(),
            "find plant by id: plant with ID '7' does not exist"
        );
    }

    #[test]
    fn test_backend_maps_to_500() {
        let err = StoreError::Backend("disk on fire".to_string()).into_api_error("create plant");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.message(),
            "create plant: storage backend failure: disk on fire"
        );
    }
}
