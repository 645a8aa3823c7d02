use std::fmt;

/// Failure kinds surfaced by the provider client and the screening pipeline.
/// Each variant carries the user-facing message, already naming the stage and ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenerError {
    /// 401-class: invalid or missing credential
    Authentication(String),
    /// 403-class: plan or entitlement restriction
    Authorization(String),
    /// Any other non-2xx status
    Http { status: u16, message: String },
    /// Transport-level failure (connect, timeout, body read)
    Network(String),
    /// Missing or malformed required field
    Data(String),
    /// Empty chain or no qualifying price
    NoData(String),
}

impl ScreenerError {
    pub fn message(&self) -> &str {
        match self {
            ScreenerError::Authentication(msg)
            | ScreenerError::Authorization(msg)
            | ScreenerError::Network(msg)
            | ScreenerError::Data(msg)
            | ScreenerError::NoData(msg) => msg,
            ScreenerError::Http { message, .. } => message,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ScreenerError::Authentication(_))
    }
}

impl fmt::Display for ScreenerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ScreenerError {}

impl From<reqwest::Error> for ScreenerError {
    fn from(err: reqwest::Error) -> Self {
        ScreenerError::Network(format!("Network error: {}", err.without_url()))
    }
}

impl From<serde_json::Error> for ScreenerError {
    fn from(err: serde_json::Error) -> Self {
        ScreenerError::Data(format!("Parse error: {}", err))
    }
}
