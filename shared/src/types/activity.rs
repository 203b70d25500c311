use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activity wire types
// ---------------------------------------------------------------------------

/// An activity as returned by `GET /activity` and `GET /activity/:id`.
///
/// Dates stay as the raw strings the service sent; use [`parse_timestamp`]
/// to interpret them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub activity_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(rename = "keyword_entry", default)]
    pub keyword_entry: Option<String>,
    #[serde(rename = "keyword_exit", default)]
    pub keyword_exit: Option<String>,
}

impl Activity {
    /// Stand-in shown when a record points at an activity the service could
    /// not return.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            activity_name: "Atividade não encontrada".to_string(),
            description: "Detalhes não disponíveis".to_string(),
            start_date: None,
            end_date: None,
            is_active: false,
            keyword_entry: None,
            keyword_exit: None,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active { "Ativa" } else { "Inativa" }
    }

    /// Full update body with `isActive` cleared; every other field is sent
    /// back unchanged.
    pub fn deactivated(&self) -> ActivityUpdate {
        ActivityUpdate {
            activity_name: self.activity_name.clone(),
            description: self.description.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            is_active: false,
            keyword_entry: self.keyword_entry.clone(),
            keyword_exit: self.keyword_exit.clone(),
        }
    }

    pub fn ends_before(&self, now: DateTime<Local>) -> bool {
        self.end_date
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|end| now > end)
    }
}

/// Body of `POST /activity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityForm {
    pub activity_name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(rename = "keyword_entry", skip_serializing_if = "Option::is_none")]
    pub keyword_entry: Option<String>,
    #[serde(rename = "keyword_exit", skip_serializing_if = "Option::is_none")]
    pub keyword_exit: Option<String>,
}

/// Body of `PUT /activity/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityUpdate {
    pub activity_name: String,
    pub description: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_active: bool,
    #[serde(rename = "keyword_entry", skip_serializing_if = "Option::is_none")]
    pub keyword_entry: Option<String>,
    #[serde(rename = "keyword_exit", skip_serializing_if = "Option::is_none")]
    pub keyword_exit: Option<String>,
}

// ---------------------------------------------------------------------------
// Draft: raw form input before validation
// ---------------------------------------------------------------------------

/// Text typed into the create/edit forms. Dates are accepted as
/// `dd/mm/aaaa hh:mm` or ISO-8601.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityDraft {
    pub name: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub keyword_entry: String,
    pub keyword_exit: String,
    pub is_active: bool,
}

impl ActivityDraft {
    pub fn new() -> Self {
        Self {
            is_active: true,
            ..Self::default()
        }
    }

    pub fn from_activity(activity: &Activity) -> Self {
        let local = |s: &Option<String>| {
            s.as_deref()
                .and_then(parse_timestamp)
                .map(|dt| dt.format(INPUT_FORMAT).to_string())
                .unwrap_or_default()
        };
        Self {
            name: activity.activity_name.clone(),
            description: activity.description.clone(),
            start: local(&activity.start_date),
            end: local(&activity.end_date),
            keyword_entry: activity.keyword_entry.clone().unwrap_or_default(),
            keyword_exit: activity.keyword_exit.clone().unwrap_or_default(),
            is_active: activity.is_active,
        }
    }

    fn validated(&self) -> Result<(DateTime<Local>, DateTime<Local>), ActivityError> {
        if self.name.trim().is_empty() {
            return Err(ActivityError::MissingField("nome".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(ActivityError::MissingField("descrição".to_string()));
        }
        let start = parse_user_datetime(&self.start)
            .ok_or_else(|| ActivityError::InvalidDate("início".to_string()))?;
        let end = parse_user_datetime(&self.end)
            .ok_or_else(|| ActivityError::InvalidDate("término".to_string()))?;
        if end < start {
            return Err(ActivityError::EndBeforeStart);
        }
        Ok((start, end))
    }

    pub fn into_form(self) -> Result<ActivityForm, ActivityError> {
        let (start, end) = self.validated()?;
        Ok(ActivityForm {
            activity_name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            start_date: to_iso(start),
            end_date: to_iso(end),
            keyword_entry: non_empty(&self.keyword_entry),
            keyword_exit: non_empty(&self.keyword_exit),
        })
    }

    pub fn into_update(self) -> Result<ActivityUpdate, ActivityError> {
        let (start, end) = self.validated()?;
        Ok(ActivityUpdate {
            activity_name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            start_date: Some(to_iso(start)),
            end_date: Some(to_iso(end)),
            is_active: self.is_active,
            keyword_entry: non_empty(&self.keyword_entry),
            keyword_exit: non_empty(&self.keyword_exit),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

const INPUT_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Interpret a timestamp sent by the service. Offsets are honoured; naive
/// timestamps are taken as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local.from_local_datetime(&naive).single();
        }
    }
    None
}

/// Interpret a date typed by the user: `dd/mm/aaaa hh:mm` or anything
/// [`parse_timestamp`] accepts.
pub fn parse_user_datetime(raw: &str) -> Option<DateTime<Local>> {
    NaiveDateTime::parse_from_str(raw.trim(), INPUT_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).single())
        .or_else(|| parse_timestamp(raw))
}

/// UTC ISO-8601 with milliseconds, e.g. `2025-10-01T12:00:00.000Z`.
pub fn to_iso(dt: DateTime<Local>) -> String {
    dt.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `dd/mm/aaaa hh:mm`, or `fallback` when absent or unparseable.
pub fn format_datetime(raw: Option<&str>, fallback: &str) -> String {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.format(INPUT_FORMAT).to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// `dd/mm/aaaa`, or `fallback` when absent or unparseable.
pub fn format_date(raw: Option<&str>, fallback: &str) -> String {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| fallback.to_string())
}

// ---------------------------------------------------------------------------
// Activity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityError {
    MissingField(String),
    InvalidDate(String),
    EndBeforeStart,
    LoadFailed,
    CreateFailed,
    UpdateFailed,
    DeactivateFailed,
    DeleteFailed,
    QrImageUnavailable,
    QrSaveFailed(String),
}

impl ActivityError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::EndBeforeStart => "END_BEFORE_START",
            Self::LoadFailed => "LOAD_FAILED",
            Self::CreateFailed => "CREATE_FAILED",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::DeactivateFailed => "DEACTIVATE_FAILED",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::QrImageUnavailable => "QR_IMAGE_UNAVAILABLE",
            Self::QrSaveFailed(_) => "QR_SAVE_FAILED",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::MissingField(field) => format!("Campo obrigatório: {}", field),
            Self::InvalidDate(field) => {
                format!("Data de {} inválida. Use dd/mm/aaaa hh:mm", field)
            }
            Self::EndBeforeStart => "O término deve ser posterior ao início.".to_string(),
            Self::LoadFailed => "Erro ao buscar atividades.".to_string(),
            Self::CreateFailed => "Erro ao cadastrar atividade.".to_string(),
            Self::UpdateFailed => "Erro ao atualizar atividade.".to_string(),
            Self::DeactivateFailed => "Erro ao desativar atividade.".to_string(),
            Self::DeleteFailed => "Erro ao excluir atividade.".to_string(),
            Self::QrImageUnavailable => "Não foi possível carregar o QR Code. Verifique se a \
                                         atividade possui as palavras-chave definidas."
                .to_string(),
            Self::QrSaveFailed(path) => format!("Não foi possível salvar o QR Code em {}", path),
        }
    }
}
