mod error;

pub use error::ApiError;

use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use shared::types::{
    Activity, ActivityForm, ActivityUpdate, AttendanceRecord, AttendanceRequest, AttendanceResult,
    Envelope, ErrorBody, LoginData, RegistrationData, TokenData,
};

use crate::session::Session;

/// Which of the two QR images of an activity to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrKind {
    Entry,
    Exit,
}

impl QrKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Entry => "qrEntryImage",
            Self::Exit => "qrExitImage",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Entry => "QR Code de Entrada",
            Self::Exit => "QR Code de Saída",
        }
    }

    pub fn file_suffix(&self) -> &'static str {
        match self {
            Self::Entry => "entrada",
            Self::Exit => "saida",
        }
    }
}

type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Client for the attendance REST service.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: HttpClient,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        let http: HttpClient = Client::builder(TokioExecutor::new()).build(https);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// `POST /auth/login`. Returns the raw token.
    pub async fn login(&self, data: &LoginData) -> Result<String, ApiError> {
        let body = encode(data)?;
        let bytes = self
            .send_expect_success(Method::POST, "/auth/login", None, Some(body))
            .await?;
        let envelope: Envelope<TokenData> = decode(&bytes)?;
        info!("Login accepted by {}", self.base_url);
        Ok(envelope.data.token)
    }

    /// `POST /auth/register`.
    pub async fn register(&self, data: &RegistrationData) -> Result<(), ApiError> {
        let body = encode(data)?;
        self.send_expect_success(Method::POST, "/auth/register", None, Some(body))
            .await?;
        info!("Registration accepted for {}", data.email);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Activities
    // -----------------------------------------------------------------------

    pub async fn list_activities(&self, session: &Session) -> Result<Vec<Activity>, ApiError> {
        self.get_data("/activity", session).await
    }

    pub async fn get_activity(&self, session: &Session, id: i64) -> Result<Activity, ApiError> {
        self.get_data(&format!("/activity/{}", id), session).await
    }

    pub async fn create_activity(
        &self,
        session: &Session,
        form: &ActivityForm,
    ) -> Result<(), ApiError> {
        let body = encode(form)?;
        self.send_expect_success(Method::POST, "/activity", Some(session.token()), Some(body))
            .await?;
        info!("Activity created: {}", form.activity_name);
        Ok(())
    }

    pub async fn update_activity(
        &self,
        session: &Session,
        id: i64,
        update: &ActivityUpdate,
    ) -> Result<Activity, ApiError> {
        let body = encode(update)?;
        let bytes = self
            .send_expect_success(
                Method::PUT,
                &format!("/activity/{}", id),
                Some(session.token()),
                Some(body),
            )
            .await?;
        let envelope: Envelope<Activity> = decode(&bytes)?;
        info!("Activity {} updated", id);
        Ok(envelope.data)
    }

    pub async fn delete_activity(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        self.send_expect_success(
            Method::DELETE,
            &format!("/activity/{}", id),
            Some(session.token()),
            None,
        )
        .await?;
        info!("Activity {} deleted", id);
        Ok(())
    }

    /// Raw image bytes of an activity's entry or exit QR code.
    pub async fn qr_image(
        &self,
        session: &Session,
        id: i64,
        kind: QrKind,
    ) -> Result<Bytes, ApiError> {
        self.send_expect_success(
            Method::GET,
            &format!("/activity/{}/{}", id, kind.endpoint()),
            Some(session.token()),
            None,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Attendance
    // -----------------------------------------------------------------------

    /// `GET /activity/:userId/myActivities` for the logged-in user.
    pub async fn my_activities(
        &self,
        session: &Session,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.get_data(&format!("/activity/{}/myActivities", session.user_id()), session)
            .await
    }

    /// The user's records, each joined with its activity. Activities are
    /// fetched concurrently; one that cannot be fetched is replaced by
    /// [`Activity::placeholder`].
    pub async fn my_activities_with_details(
        &self,
        session: &Session,
    ) -> Result<Vec<(AttendanceRecord, Activity)>, ApiError> {
        let records = self.my_activities(session).await?;

        let mut lookups = JoinSet::new();
        for (index, record) in records.iter().enumerate() {
            let client = self.clone();
            let session = session.clone();
            let activity_id = record.activity_id;
            lookups.spawn(async move {
                let result = client.get_activity(&session, activity_id).await;
                (index, activity_id, result)
            });
        }

        let mut activities: Vec<Option<Activity>> = vec![None; records.len()];
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, _, Ok(activity))) => activities[index] = Some(activity),
                Ok((_, activity_id, Err(e))) => {
                    warn!("Failed to fetch activity {}: {}", activity_id, e);
                }
                Err(e) => warn!("Activity lookup task failed: {}", e),
            }
        }

        Ok(records
            .into_iter()
            .zip(activities)
            .map(|(record, activity)| {
                let activity =
                    activity.unwrap_or_else(|| Activity::placeholder(record.activity_id));
                (record, activity)
            })
            .collect())
    }

    /// `POST /attendance/qr`.
    ///
    /// The service answers business failures (duplicate entry, wrong
    /// keyword) with a `{ success, error }` body on a non-2xx status, so the
    /// body is interpreted whenever it parses.
    pub async fn submit_attendance(
        &self,
        session: &Session,
        request: &AttendanceRequest,
    ) -> Result<AttendanceResult, ApiError> {
        let body = encode(request)?;
        let (status, bytes) = self
            .send(Method::POST, "/attendance/qr", Some(session.token()), Some(body))
            .await?;

        match serde_json::from_slice::<AttendanceResult>(&bytes) {
            Ok(result) => {
                let result = result.resolve(status.is_success());
                debug!(
                    "Attendance response {}: success={}",
                    status.as_u16(),
                    result.is_success()
                );
                Ok(result)
            }
            Err(_) if status.is_success() => Ok(AttendanceResult::default().resolve(true)),
            Err(_) => Err(status_error(status, &bytes)),
        }
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        session: &Session,
    ) -> Result<T, ApiError> {
        let bytes = self
            .send_expect_success(Method::GET, path, Some(session.token()), None)
            .await?;
        let envelope: Envelope<T> = decode(&bytes)?;
        Ok(envelope.data)
    }

    async fn send_expect_success(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, ApiError> {
        let (status, bytes) = self.send(method, path, token, body).await?;
        if !status.is_success() {
            return Err(status_error(status, &bytes));
        }
        Ok(bytes)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Bytes), ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = Request::builder()
            .method(method.clone())
            .uri(&url)
            .header(ACCEPT, "application/json");

        if body.is_some() {
            request = request.header(CONTENT_TYPE, "application/json");
        }

        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = request
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e: http::Error| ApiError::InvalidRequest(e.to_string()))?;

        debug!("{} {}", method, url);

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e: hyper_util::client::legacy::Error| {
                warn!("{} {} failed: {}", method, url, e);
                ApiError::Transport(e.to_string())
            })?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e: hyper::Error| ApiError::Transport(e.to_string()))?
            .to_bytes();

        debug!("{} {} -> {} ({} bytes)", method, url, status.as_u16(), bytes.len());

        Ok((status, bytes))
    }
}

fn encode<T: Serialize>(body: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

fn status_error(status: StatusCode, bytes: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(bytes)
        .ok()
        .and_then(|body| body.text().map(str::to_string));
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_dropped() {
        let client = ApiClient::new("http://localhost:3056/");
        assert_eq!(client.base_url(), "http://localhost:3056");
    }

    #[test]
    fn test_status_error_reads_body_text() {
        let e = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Palavra-chave inválida"}"#.as_bytes(),
        );
        assert_eq!(e.server_message(), Some("Palavra-chave inválida"));

        let e = status_error(StatusCode::INTERNAL_SERVER_ERROR, b"<html>");
        assert!(e.server_message().is_none());
    }

    #[test]
    fn test_qr_kind_paths() {
        assert_eq!(QrKind::Entry.endpoint(), "qrEntryImage");
        assert_eq!(QrKind::Exit.file_suffix(), "saida");
    }
}
