use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures of the historical query path. All of these reach the HTTP caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
    #[error("invalid range: {0}")]
    Validation(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("query timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl HistoryError {
    /// True for failures caused by the caller's input rather than the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, HistoryError::Validation(_))
    }
}

/// Failures inside the broadcast hub. Never sent to any client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RelayError {
    #[error("malformed payload: {0}")]
    Parse(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("connection limit reached ({0})")]
    Capacity(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("server.port = 0".into());
        assert_eq!(err.to_string(), "config validation error: server.port = 0");
    }

    #[test]
    fn history_error_display() {
        let err = HistoryError::Validation("range magnitude must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid range: range magnitude must be positive"
        );

        let err = HistoryError::Query("bucket not found".into());
        assert_eq!(err.to_string(), "query failed: bucket not found");

        let err = HistoryError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "query timed out after 30s");
    }

    #[test]
    fn history_error_classification() {
        assert!(HistoryError::Validation("x".into()).is_validation());
        assert!(!HistoryError::Query("x".into()).is_validation());
        assert!(!HistoryError::Timeout(Duration::from_secs(1)).is_validation());
    }

    #[test]
    fn relay_error_display() {
        let err = RelayError::Parse("expected value at line 1 column 1".into());
        assert_eq!(
            err.to_string(),
            "malformed payload: expected value at line 1 column 1"
        );

        let err = RelayError::Send("queue full".into());
        assert_eq!(err.to_string(), "send failed: queue full");

        let err = RelayError::Capacity(64);
        assert_eq!(err.to_string(), "connection limit reached (64)");
    }

    #[test]
    fn app_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::Config(_)));
        assert!(app_err.to_string().contains("bad toml"));
    }

    #[test]
    fn app_error_from_history() {
        let app_err: AppError = HistoryError::Query("stream reset".into()).into();
        assert!(matches!(app_err, AppError::History(_)));
        assert!(app_err.to_string().contains("stream reset"));
    }

    #[test]
    fn app_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("port taken"));
    }
}
