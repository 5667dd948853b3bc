use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Transport,
    Status(u16),
    Decode,
}

/// Failure talking to the reporting API. Never crosses into filter state,
/// option lists or projections; callers convert it at the request boundary.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Status(code),
            message: message.into(),
        }
    }

    pub fn decode(err: impl std::error::Error) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ApiErrorKind::Transport => write!(f, "transport error: {}", self.message),
            ApiErrorKind::Status(code) => write!(f, "unexpected status {code}: {}", self.message),
            ApiErrorKind::Decode => write!(f, "invalid response body: {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::decode(err);
        }
        match err.status() {
            Some(status) => Self::status(status.as_u16(), err.to_string()),
            None => Self::transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err)
    }
}

/// Startup failure: the configured reporting API url is unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid reporting API url {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure_kind() {
        assert_eq!(
            ApiError::status(502, "Bad Gateway").to_string(),
            "unexpected status 502: Bad Gateway"
        );
        let err: ApiError = serde_json::from_str::<Vec<String>>("{").unwrap_err().into();
        assert_eq!(err.kind, ApiErrorKind::Decode);
    }

    #[test]
    fn config_error_names_the_rejected_url() {
        let err = ConfigError {
            value: "ftp://example.com".to_string(),
            reason: "expected an http(s) base url".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid reporting API url \"ftp://example.com\": expected an http(s) base url"
        );
    }
}
