use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// Text the service attached to a failed response, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_detection() {
        let e = ApiError::Status {
            status: 401,
            message: None,
        };
        assert!(e.is_unauthorized());
        assert!(!ApiError::Transport("x".into()).is_unauthorized());
    }

    #[test]
    fn test_status_display_includes_message() {
        let e = ApiError::Status {
            status: 400,
            message: Some("Entrada já registrada".into()),
        };
        assert_eq!(e.to_string(), "HTTP 400: Entrada já registrada");
        assert_eq!(e.server_message(), Some("Entrada já registrada"));
    }
}
