//! PTV Timetable API error types

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Errors that can occur during PTV Timetable API operations
#[derive(Debug, Error)]
pub enum PtvError {
    /// No response was obtained, or the response status was not successful
    ///
    /// `Display` omits the query of `uri`, which carries the developer id
    /// and signature.
    #[error("PTV API request failed ({}): {}", status_label(.status, .reason), without_query(.uri))]
    Transport {
        /// Underlying failure
        #[source]
        cause: TransportCause,
        /// Response status, when a response was received
        status: Option<StatusCode>,
        /// Canonical reason phrase of `status`, not the phrase sent by the server
        reason: Option<String>,
        /// The request URI that failed
        uri: Url,
    },

    /// The response body could not be parsed into the expected shape
    #[error("Failed to decode PTV API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The line map page no longer has the expected markup
    #[error("Line map page format changed: {0}")]
    MapPageFormat(String),

    /// An argument was rejected before any request was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Cause carried by [`PtvError::Transport`]
#[derive(Debug, Error)]
pub enum TransportCause {
    /// The request could not be sent or the body could not be read
    ///
    /// The request URL is stripped from the error.
    #[error(transparent)]
    Request(reqwest::Error),

    /// The server answered with a non-success status
    #[error("unsuccessful status code {0}")]
    UnsuccessfulStatus(StatusCode),
}

impl From<reqwest::Error> for TransportCause {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.without_url())
    }
}

impl PtvError {
    /// Build a transport error, deriving the reason phrase from the status
    pub(crate) fn transport(
        cause: impl Into<TransportCause>,
        status: Option<StatusCode>,
        uri: Url,
    ) -> Self {
        Self::Transport {
            cause: cause.into(),
            status,
            reason: status
                .and_then(|s| s.canonical_reason())
                .map(str::to_string),
            uri,
        }
    }

    /// Response status carried by a transport error
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Request URI carried by a transport error
    #[must_use]
    pub const fn uri(&self) -> Option<&Url> {
        match self {
            Self::Transport { uri, .. } => Some(uri),
            _ => None,
        }
    }

    /// Returns true if the transport gave up waiting for the server
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                cause: TransportCause::Request(e),
                ..
            } if e.is_timeout()
        )
    }

    /// Returns true if a caller-side retry could succeed
    ///
    /// The client never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status: None, .. } => true,
            Self::Transport {
                status: Some(status),
                ..
            } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
            },
            Self::Decode(_)
            | Self::MapPageFormat(_)
            | Self::InvalidArgument(_)
            | Self::ConfigurationError(_) => false,
        }
    }
}

#[allow(clippy::ref_option)]
fn status_label(status: &Option<StatusCode>, reason: &Option<String>) -> String {
    match (status, reason) {
        (Some(status), Some(reason)) => format!("{} {reason}", status.as_u16()),
        (Some(status), None) => status.as_u16().to_string(),
        (None, _) => "no response".to_string(),
    }
}

fn without_query(uri: &Url) -> Url {
    let mut uri = uri.clone();
    uri.set_query(None);
    uri
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("http://timetableapi.ptv.vic.gov.au/v2/healthcheck").unwrap()
    }

    #[test]
    fn test_transport_error_populates_reason() {
        let err = PtvError::transport(
            TransportCause::UnsuccessfulStatus(StatusCode::INTERNAL_SERVER_ERROR),
            Some(StatusCode::INTERNAL_SERVER_ERROR),
            uri(),
        );

        match &err {
            PtvError::Transport { status, reason, .. } => {
                assert_eq!(*status, Some(StatusCode::INTERNAL_SERVER_ERROR));
                assert_eq!(reason.as_deref(), Some("Internal Server Error"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.uri(), Some(&uri()));
    }

    #[test]
    fn test_error_display() {
        let err = PtvError::transport(
            TransportCause::UnsuccessfulStatus(StatusCode::FORBIDDEN),
            Some(StatusCode::FORBIDDEN),
            uri(),
        );
        let display = err.to_string();
        assert!(display.contains("403 Forbidden"));
        assert!(display.contains("/v2/healthcheck"));

        let signed = Url::parse(
            "http://timetableapi.ptv.vic.gov.au/v2/healthcheck?devid=dev1&signature=ABC",
        )
        .unwrap();
        let err = PtvError::transport(
            TransportCause::UnsuccessfulStatus(StatusCode::FORBIDDEN),
            Some(StatusCode::FORBIDDEN),
            signed.clone(),
        );
        let display = err.to_string();
        assert!(display.ends_with("http://timetableapi.ptv.vic.gov.au/v2/healthcheck"));
        assert!(!display.contains("devid="));
        assert!(!display.contains("signature="));
        assert_eq!(err.uri(), Some(&signed));

        let err = PtvError::MapPageFormat("no route-map element".to_string());
        assert!(err.to_string().contains("route-map"));

        let err = PtvError::InvalidArgument("modes".to_string());
        assert!(err.to_string().contains("modes"));
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(&None, &None), "no response");
        assert_eq!(status_label(&Some(StatusCode::NOT_FOUND), &None), "404");
        assert_eq!(
            status_label(&Some(StatusCode::NOT_FOUND), &Some("Not Found".to_string())),
            "404 Not Found"
        );
    }

    #[test]
    fn test_retryable_errors() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::REQUEST_TIMEOUT,
        ] {
            let err =
                PtvError::transport(TransportCause::UnsuccessfulStatus(status), Some(status), uri());
            assert!(err.is_retryable(), "{status} should be retryable");
        }
    }

    #[test]
    fn test_non_retryable_errors() {
        let err = PtvError::transport(
            TransportCause::UnsuccessfulStatus(StatusCode::FORBIDDEN),
            Some(StatusCode::FORBIDDEN),
            uri(),
        );
        assert!(!err.is_retryable());

        let decode = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(!PtvError::Decode(decode).is_retryable());
        assert!(!PtvError::MapPageFormat("x".to_string()).is_retryable());
        assert!(!PtvError::InvalidArgument("x".to_string()).is_retryable());
        assert!(!PtvError::ConfigurationError("x".to_string()).is_retryable());
    }

    #[test]
    fn test_non_transport_errors_have_no_status() {
        let err = PtvError::InvalidArgument("x".to_string());
        assert!(err.status().is_none());
        assert!(err.uri().is_none());
        assert!(!err.is_timeout());
    }
}
