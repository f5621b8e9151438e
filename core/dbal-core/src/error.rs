//! Error types for the DBAL abstraction layer.
//!
//! All public APIs return `DbalResult<T>` - no panics in library code.

use thiserror::Error;

/// Unified error type for all DBAL operations.
#[derive(Debug, Error)]
pub enum DbalError {
    /// Driver backend failed to connect
    #[error("connection failed: {message} ({code})")]
    Connection { code: String, message: String },

    /// Driver backend rejected the rendered SQL
    #[error("query failed: {message} ({code})\nSQL: {sql}")]
    Query {
        code: String,
        message: String,
        sql: String,
    },

    /// A marker has no parameter, or a parameter has no marker
    #[error("parameter count mismatch: {markers} markers, {params} parameters")]
    ParameterCountMismatch { markers: usize, params: usize },

    /// A named marker is absent from the parameter mapping
    #[error("missing named parameter '{0}'")]
    MissingParameter(String),

    /// Query template could not be scanned
    #[error("malformed query template: {message}\nSQL: {sql}")]
    MalformedTemplate { message: String, sql: String },

    /// Expected cache row file is absent (corruption or partial write)
    #[error("missing cache row {index} in {path}")]
    MissingCacheRow { index: usize, path: String },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Result set contract violation reported by a driver
    #[error("result set error: {0}")]
    ResultSet(String),

    /// Requested column does not exist in the row
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Type mismatch between expected and actual values
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Invalid operation
    #[error("invalid operation: {message}\nContext: {context}")]
    InvalidOperation { message: String, context: String },

    /// Feature not available on this backend or result
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Server registry misuse
    #[error("registry error: {0}")]
    Registry(String),
}

impl DbalError {
    /// Errors raised by the query compiler before any I/O happens.
    ///
    /// These are always caller bugs and are never worth retrying.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            DbalError::ParameterCountMismatch { .. }
                | DbalError::MissingParameter(_)
                | DbalError::MalformedTemplate { .. }
        )
    }

    pub(crate) fn malformed(message: impl Into<String>, sql: &str) -> Self {
        DbalError::MalformedTemplate {
            message: message.into(),
            sql: sql.to_string(),
        }
    }
}

/// Result type alias for all DBAL operations.
pub type DbalResult<T> = Result<T, DbalError>;

impl From<serde_json::Error> for DbalError {
    fn from(err: serde_json::Error) -> Self {
        DbalError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_connection() {
        let err = DbalError::Connection {
            code: "2002".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "connection failed: connection refused (2002)");
    }

    #[test]
    fn error_display_query() {
        let err = DbalError::Query {
            code: "1".to_string(),
            message: "no such table: users".to_string(),
            sql: "SELECT * FROM users".to_string(),
        };
        assert!(err.to_string().contains("no such table"));
        assert!(err.to_string().contains("SELECT * FROM users"));
    }

    #[test]
    fn error_display_parameter_count() {
        let err = DbalError::ParameterCountMismatch {
            markers: 2,
            params: 1,
        };
        assert_eq!(
            err.to_string(),
            "parameter count mismatch: 2 markers, 1 parameters"
        );
    }

    #[test]
    fn error_display_missing_cache_row() {
        let err = DbalError::MissingCacheRow {
            index: 7,
            path: "/tmp/sql-cache/a/b/c/abc".to_string(),
        };
        assert!(err.to_string().contains("missing cache row 7"));
    }

    #[test]
    fn compile_errors_are_classified() {
        assert!(DbalError::MissingParameter("id".into()).is_compile_error());
        assert!(DbalError::malformed("unterminated literal", "SELECT '").is_compile_error());
        assert!(!DbalError::Serialization("bad json".into()).is_compile_error());
    }

    #[test]
    fn serde_json_error_converts() {
        let err: DbalError = serde_json::from_str::<i32>("nope").unwrap_err().into();
        assert!(matches!(err, DbalError::Serialization(_)));
    }

    #[test]
    fn dbal_result_err() {
        let result: DbalResult<i32> = Err(DbalError::ColumnNotFound("name".into()));
        assert!(result.is_err());
    }
}
