use std::error::Error as StdError;

use thiserror::Error;

/// Boxed cause carried by [`DelegationError::UpstreamError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error types that can occur when reading delegation data for a space.
#[derive(Error, Debug)]
pub enum DelegationError {
    /// The space configuration cannot serve the requested reader.
    /// Always raised before any request leaves the process.
    #[error("Configuration Error: {0}")]
    ConfigurationError(String),

    /// The delegation backend could not be reached, answered with a non-success
    /// status, or returned a body that does not match the expected payload.
    #[error("Upstream Error: {message}")]
    UpstreamError {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A request could not be assembled locally.
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),
}

impl DelegationError {
    pub fn upstream<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        DelegationError::UpstreamError {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn upstream_status(status: http::StatusCode, body: &[u8]) -> Self {
        DelegationError::UpstreamError {
            message: format!(
                "backend responded with {}: {}",
                status,
                String::from_utf8_lossy(body)
            ),
            source: None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, DelegationError::ConfigurationError(_))
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, DelegationError::UpstreamError { .. })
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for DelegationError {
    fn from(err: reqwest::Error) -> Self {
        let message = match err.status() {
            Some(status) => format!("backend responded with {}", status),
            None => "request to delegation backend failed".to_string(),
        };
        DelegationError::upstream(message, err)
    }
}

impl From<http::Error> for DelegationError {
    fn from(err: http::Error) -> Self {
        DelegationError::InvalidRequest(err.to_string())
    }
}

impl From<url::ParseError> for DelegationError {
    fn from(err: url::ParseError) -> Self {
        DelegationError::InvalidRequest(format!("Invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::DelegationError;

    #[test]
    fn upstream_error_exposes_its_cause() {
        let cause = serde_json::from_slice::<serde_json::Value>(b"not json").unwrap_err();
        let err = DelegationError::upstream("malformed body", cause);

        assert!(err.is_upstream());
        assert_eq!(err.to_string(), "Upstream Error: malformed body");
        let source = err.source().expect("cause should be attached");
        assert!(source.downcast_ref::<serde_json::Error>().is_some());
    }

    #[test]
    fn status_errors_carry_the_body_text() {
        let err = DelegationError::upstream_status(http::StatusCode::BAD_GATEWAY, b"oops");
        assert_eq!(
            err.to_string(),
            "Upstream Error: backend responded with 502 Bad Gateway: oops"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn url_errors_are_local_request_errors() {
        let err: DelegationError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, DelegationError::InvalidRequest(_)));
    }
}
