use thiserror::Error;

use shared::types::AttendanceRequest;

use crate::session::Session;

/// Shown when a decoded code is not an attendance payload.
pub const INVALID_QR_MESSAGE: &str = "QR Code inválido.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload has no ';' separator")]
    MissingSeparator,

    #[error("activity id {0:?} is not a number")]
    InvalidActivityId(String),
}

/// A decoded `<activityId>;<keyword>` QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPayload {
    pub activity_id_part: String,
    pub keyword_part: String,
    pub activity_id: i64,
}

impl ScanPayload {
    /// Split on the first `;`. Both halves are trimmed; anything after a
    /// second `;` belongs to the keyword.
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let (id_part, keyword_part) = text
            .split_once(';')
            .ok_or(PayloadError::MissingSeparator)?;

        let id_part = id_part.trim();
        let activity_id = id_part
            .parse::<i64>()
            .map_err(|_| PayloadError::InvalidActivityId(id_part.to_string()))?;

        Ok(Self {
            activity_id_part: id_part.to_string(),
            keyword_part: keyword_part.trim().to_string(),
            activity_id,
        })
    }

    /// The check-in body for this payload on behalf of `session`'s user.
    pub fn to_request(&self, session: &Session) -> AttendanceRequest {
        AttendanceRequest {
            qr_code: session.user_id(),
            activity_id: self.activity_id,
            keyword: self.keyword_part.clone(),
        }
    }
}
