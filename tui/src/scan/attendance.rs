use async_trait::async_trait;
use tracing::{info, warn};

use shared::types::{AttendanceRequest, AttendanceResult, friendly_error_message};

use crate::api::{ApiClient, ApiError};
use crate::session::Session;

use super::payload::ScanPayload;

pub const SUCCESS_MESSAGE: &str = "Presença registrada com sucesso!";
pub const CONNECTION_ERROR_MESSAGE: &str = "Erro ao conectar com o servidor";
pub const PROCESSING_ERROR_MESSAGE: &str = "Erro ao processar QR Code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceOutcome {
    Success(String),
    Failure(String),
}

impl AttendanceOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Failure(m) => m,
        }
    }
}

/// Sends check-ins to the service.
#[async_trait]
pub trait AttendanceSubmitter: Send + Sync {
    async fn submit(
        &self,
        session: &Session,
        request: &AttendanceRequest,
    ) -> Result<AttendanceResult, ApiError>;
}

#[async_trait]
impl AttendanceSubmitter for ApiClient {
    async fn submit(
        &self,
        session: &Session,
        request: &AttendanceRequest,
    ) -> Result<AttendanceResult, ApiError> {
        self.submit_attendance(session, request).await
    }
}

/// Submit `payload` for `session`'s user and turn the answer into the text
/// shown in the result dialog.
pub async fn submit_attendance(
    submitter: &dyn AttendanceSubmitter,
    session: &Session,
    payload: &ScanPayload,
) -> AttendanceOutcome {
    let request = payload.to_request(session);

    match submitter.submit(session, &request).await {
        Ok(result) if result.is_success() => {
            info!("Attendance registered for activity {}", request.activity_id);
            AttendanceOutcome::Success(SUCCESS_MESSAGE.to_string())
        }
        Ok(result) => {
            let raw = result
                .error
                .as_deref()
                .or(result.message.as_deref())
                .filter(|s| !s.trim().is_empty());
            warn!(
                "Attendance rejected for activity {}: {}",
                request.activity_id,
                raw.unwrap_or("no reason given")
            );
            AttendanceOutcome::Failure(
                raw.map(friendly_error_message)
                    .unwrap_or_else(|| PROCESSING_ERROR_MESSAGE.to_string()),
            )
        }
        Err(e) => {
            warn!("Attendance submission failed: {}", e);
            match e {
                ApiError::Status {
                    message: Some(ref m),
                    ..
                } => AttendanceOutcome::Failure(friendly_error_message(m)),
                ApiError::Status { message: None, .. } | ApiError::Decode(_) => {
                    AttendanceOutcome::Failure(PROCESSING_ERROR_MESSAGE.to_string())
                }
                ApiError::Transport(_) | ApiError::InvalidRequest(_) => {
                    AttendanceOutcome::Failure(CONNECTION_ERROR_MESSAGE.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_tokens::token_for;
    use std::sync::Mutex;

    struct Canned {
        reply: Mutex<Option<Result<AttendanceResult, ApiError>>>,
        seen: Mutex<Vec<AttendanceRequest>>,
    }

    impl Canned {
        fn new(reply: Result<AttendanceResult, ApiError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AttendanceSubmitter for Canned {
        async fn submit(
            &self,
            _session: &Session,
            request: &AttendanceRequest,
        ) -> Result<AttendanceResult, ApiError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.lock().unwrap().take().unwrap()
        }
    }

    fn session() -> Session {
        Session::from_token(&token_for(42, "USER")).unwrap()
    }

    fn payload() -> ScanPayload {
        ScanPayload::parse("7;ROCHEDO").unwrap()
    }

    #[tokio::test]
    async fn test_success() {
        let canned = Canned::new(Ok(AttendanceResult {
            success: Some(true),
            ..Default::default()
        }));
        let outcome = submit_attendance(&canned, &session(), &payload()).await;
        assert_eq!(outcome, AttendanceOutcome::Success(SUCCESS_MESSAGE.into()));

        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen[0].qr_code, 42);
        assert_eq!(seen[0].activity_id, 7);
        assert_eq!(seen[0].keyword, "ROCHEDO");
    }

    #[tokio::test]
    async fn test_reported_failure_is_friendly() {
        let canned = Canned::new(Ok(AttendanceResult {
            success: Some(false),
            error: Some("ENTRADA JÁ REGISTRADA para este usuário".into()),
            message: None,
        }));
        let outcome = submit_attendance(&canned, &session(), &payload()).await;
        assert_eq!(
            outcome,
            AttendanceOutcome::Failure("A sua entrada já foi registrada!".into())
        );
    }

    #[tokio::test]
    async fn test_unmatched_failure_passes_through() {
        let canned = Canned::new(Ok(AttendanceResult {
            success: Some(false),
            error: None,
            message: Some("Fora do horário".into()),
        }));
        let outcome = submit_attendance(&canned, &session(), &payload()).await;
        assert_eq!(outcome, AttendanceOutcome::Failure("Fora do horário".into()));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let canned = Canned::new(Err(ApiError::Transport("connection refused".into())));
        let outcome = submit_attendance(&canned, &session(), &payload()).await;
        assert_eq!(
            outcome,
            AttendanceOutcome::Failure(CONNECTION_ERROR_MESSAGE.into())
        );
    }

    #[tokio::test]
    async fn test_status_without_body() {
        let canned = Canned::new(Err(ApiError::Status {
            status: 500,
            message: None,
        }));
        let outcome = submit_attendance(&canned, &session(), &payload()).await;
        assert_eq!(
            outcome,
            AttendanceOutcome::Failure(PROCESSING_ERROR_MESSAGE.into())
        );
    }
}
