use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::types::activity::Activity;

// ---------------------------------------------------------------------------
// QR check-in wire types
// ---------------------------------------------------------------------------

/// Body of `POST /attendance/qr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    /// The participant's user id. The name is the service's.
    pub qr_code: i64,
    pub activity_id: i64,
    pub keyword: String,
}

/// Response of `POST /attendance/qr`. Also sent on non-2xx statuses.
///
/// `success` is absent from some replies; the HTTP status decides then.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AttendanceResult {
    /// Settle `success` against the HTTP status: a non-2xx reply is never a
    /// success, and a 2xx reply without the field is one.
    pub fn resolve(mut self, status_ok: bool) -> Self {
        self.success = Some(status_ok && self.success.unwrap_or(true));
        self
    }

    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }
}

// ---------------------------------------------------------------------------
// Friendly error mapping
// ---------------------------------------------------------------------------

/// Raw server text fragments (lowercase) and the message shown instead.
const FRIENDLY_MESSAGES: &[(&[&str], &str)] = &[
    (&["entrada já registrada"], "A sua entrada já foi registrada!"),
    (&["saída já registrada"], "A sua saída já foi registrada!"),
    (
        &["entrada não registrada"],
        "Você precisa registrar a entrada antes da saída.",
    ),
    (
        &["palavra-chave inválida", "keyword inválida"],
        "Palavra-chave inválida para esta atividade.",
    ),
    (&["atividade não encontrada"], "Atividade não encontrada."),
    (
        &["atividade inativa", "atividade encerrada"],
        "Esta atividade não está mais ativa.",
    ),
];

/// Translate raw server error text into the message shown to participants.
/// Matching is a case-insensitive substring test; unmatched text is returned
/// unchanged.
pub fn friendly_error_message(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    FRIENDLY_MESSAGES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lowered.contains(n)))
        .map(|(_, friendly)| friendly.to_string())
        .unwrap_or_else(|| raw.to_string())
}

// ---------------------------------------------------------------------------
// Attendance records ("minhas atividades")
// ---------------------------------------------------------------------------

/// One row of `GET /activity/:userId/myActivities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i64,
    pub user_id: i64,
    pub activity_id: i64,
    #[serde(default)]
    pub registered_at: Option<String>,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub exit_time: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Finished,
    Completed,
    Pending,
    Ongoing,
    NotStarted,
}

impl AttendanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Finished => "Atividade Encerrada",
            Self::Completed => "Concluída",
            Self::Pending => "Presença Pendente",
            Self::Ongoing => "Em Andamento",
            Self::NotStarted => "Não Iniciada",
        }
    }
}

/// Badge for a participant's record. An inactive or unknown activity wins
/// over everything else; an entry without exit after the activity ended is
/// pending.
pub fn attendance_status(
    record: &AttendanceRecord,
    activity: Option<&Activity>,
    now: DateTime<Local>,
) -> AttendanceStatus {
    let Some(activity) = activity.filter(|a| a.is_active) else {
        return AttendanceStatus::Finished;
    };

    match (record.entry_time.is_some(), record.exit_time.is_some()) {
        (true, true) => AttendanceStatus::Completed,
        (true, false) if activity.ends_before(now) => AttendanceStatus::Pending,
        (true, false) => AttendanceStatus::Ongoing,
        _ => AttendanceStatus::NotStarted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::activity::parse_timestamp;

    fn record(entry: Option<&str>, exit: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            user_id: 5,
            activity_id: 7,
            registered_at: None,
            entry_time: entry.map(String::from),
            exit_time: exit.map(String::from),
            is_active: true,
        }
    }

    fn activity(active: bool, end: Option<&str>) -> Activity {
        let mut a = Activity::placeholder(7);
        a.is_active = active;
        a.end_date = end.map(String::from);
        a
    }

    #[test]
    fn test_friendly_message_matches_case_insensitively() {
        assert_eq!(
            friendly_error_message("ENTRADA JÁ REGISTRADA para esta atividade"),
            "A sua entrada já foi registrada!"
        );
        assert_eq!(
            friendly_error_message("Entrada já registrada"),
            "A sua entrada já foi registrada!"
        );
    }

    #[test]
    fn test_friendly_message_passthrough() {
        assert_eq!(friendly_error_message("Algo estranho"), "Algo estranho");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let r = AttendanceRequest {
            qr_code: 42,
            activity_id: 7,
            keyword: "ROCHEDO".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["qrCode"], 42);
        assert_eq!(json["activityId"], 7);
        assert_eq!(json["keyword"], "ROCHEDO");
    }

    #[test]
    fn test_status_inactive_activity_is_finished() {
        let now = Local::now();
        let r = record(Some("2025-01-01T10:00"), Some("2025-01-01T11:00"));
        assert_eq!(
            attendance_status(&r, Some(&activity(false, None)), now),
            AttendanceStatus::Finished
        );
        assert_eq!(attendance_status(&r, None, now), AttendanceStatus::Finished);
    }

    #[test]
    fn test_status_progression() {
        let now = parse_timestamp("2025-10-01T12:00").unwrap();
        let open = activity(true, Some("2025-10-01T18:00"));
        let closed = activity(true, Some("2025-10-01T09:00"));

        assert_eq!(
            attendance_status(&record(None, None), Some(&open), now),
            AttendanceStatus::NotStarted
        );
        assert_eq!(
            attendance_status(&record(Some("x"), None), Some(&open), now),
            AttendanceStatus::Ongoing
        );
        assert_eq!(
            attendance_status(&record(Some("x"), None), Some(&closed), now),
            AttendanceStatus::Pending
        );
        assert_eq!(
            attendance_status(&record(Some("x"), Some("y")), Some(&closed), now),
            AttendanceStatus::Completed
        );
    }
}
