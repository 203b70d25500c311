use serde::{Deserialize, Serialize};

/// Success envelope used by every JSON endpoint: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Error body returned by the service on failures.
///
/// Endpoints are not consistent about the key, so both are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// The first non-empty human readable text, `error` before `message`.
    pub fn text(&self) -> Option<&str> {
        self.error
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.message.as_deref().filter(|s| !s.trim().is_empty()))
    }
}
