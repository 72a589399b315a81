//! Error types for manifest conversion
//!
//! Every error is terminal for the conversion call: the input manifest has
//! to be fixed by the caller, so nothing here is retryable.

use thiserror::Error;

use crate::quantity::QuantityError;

/// Error returned by the conversion functions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// A memory, disk or CPU string could not be parsed
    #[error("couldn't parse resource quantity {raw}: {reason}")]
    QuantityParse {
        /// The string exactly as it appeared in the manifest
        raw: String,
        reason: QuantityError,
    },

    /// The health check type is not one of the supported tokens
    #[error("unknown health check type {check_type}, supported types are http and port")]
    InvalidHealthCheckType { check_type: String },

    /// The health check timeout was below zero
    #[error("health check timeouts can't be negative")]
    NegativeTimeout { timeout: i32 },

    /// An endpoint was set on a check that isn't http
    #[error("health check endpoints can only be used with http checks")]
    EndpointNotAllowed { check_type: String },

    /// No application with this name exists in the manifest
    #[error("the manifest doesn't contain an app named {name:?}")]
    AppNotFound { name: String },
}

impl ConversionError {
    /// Stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuantityParse { .. } => "quantity_parse",
            Self::InvalidHealthCheckType { .. } => "invalid_health_check_type",
            Self::NegativeTimeout { .. } => "negative_timeout",
            Self::EndpointNotAllowed { .. } => "endpoint_not_allowed",
            Self::AppNotFound { .. } => "app_not_found",
        }
    }
}

/// Result alias for conversion operations
pub type Result<T> = std::result::Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_parse_message_embeds_raw() {
        let err = ConversionError::QuantityParse {
            raw: "30Y".to_string(),
            reason: QuantityError::Format,
        };

        assert_eq!(
            err.to_string(),
            "couldn't parse resource quantity 30Y: quantities must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'"
        );
        assert_eq!(err.kind(), "quantity_parse");
    }

    #[test]
    fn test_health_check_messages() {
        let err = ConversionError::InvalidHealthCheckType {
            check_type: "foo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown health check type foo, supported types are http and port"
        );

        let err = ConversionError::NegativeTimeout { timeout: -1 };
        assert_eq!(err.to_string(), "health check timeouts can't be negative");

        let err = ConversionError::EndpointNotAllowed {
            check_type: "port".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "health check endpoints can only be used with http checks"
        );
    }

    #[test]
    fn test_app_not_found_message_quotes_name() {
        let err = ConversionError::AppNotFound {
            name: "web".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "the manifest doesn't contain an app named \"web\""
        );
        assert_eq!(err.kind(), "app_not_found");
    }
}
