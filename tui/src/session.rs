use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use shared::types::{JwtClaims, Role};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token could not be decoded: {0}")]
    Decode(String),

    #[error("token carries no valid user id")]
    MissingUserId,

    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Read the claims of a token without verifying its signature.
///
/// Expiry is not checked either; the service rejects stale tokens and the
/// client reacts to that.
pub fn decode_claims(token: &str) -> Result<JwtClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<JwtClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| SessionError::Decode(e.to_string()))
}

/// The logged-in user, derived once from the login token.
///
/// Immutable: a new login produces a new `Session`, logout drops it. The
/// user id is guaranteed positive, so attendance can never be submitted
/// under a placeholder id.
#[derive(Clone)]
pub struct Session {
    token: String,
    claims: JwtClaims,
}

impl Session {
    pub fn from_token(token: &str) -> Result<Self, SessionError> {
        let claims = decode_claims(token)?;
        if claims.id <= 0 {
            return Err(SessionError::MissingUserId);
        }
        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> i64 {
        self.claims.id
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn is_admin(&self) -> bool {
        self.claims.role.is_admin()
    }

    pub fn display_name(&self) -> &str {
        self.claims
            .name
            .as_deref()
            .or(self.claims.email.as_deref())
            .unwrap_or("Participante")
    }

    pub fn claims(&self) -> &JwtClaims {
        &self.claims
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.claims.id)
            .field("role", &self.claims.role)
            .field("token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    role: Role,
}

/// Keeps `{ token, role }` in a small JSON file between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, or `None` when nothing is stored. A stored token
    /// that no longer decodes is an error; callers clear it.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored session at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&contents)?;
        let session = Session::from_token(&stored.token)?;

        if session.role() != stored.role {
            warn!(
                "Stored role {} differs from token role {}; using the token",
                stored.role,
                session.role()
            );
        }

        info!("Restored session for user {}", session.user_id());
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let stored = StoredSession {
            token: session.token().to_string(),
            role: session.role(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(&json)?;

        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    /// Remove the stored session. Clearing twice is fine.
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_tokens::token_for;
    use super::*;

    #[test]
    fn test_session_from_token_reads_claims() {
        let s = Session::from_token(&token_for(42, "USER")).unwrap();
        assert_eq!(s.user_id(), 42);
        assert_eq!(s.role(), Role::User);
        assert_eq!(s.display_name(), "Ana Souza");
        assert!(!s.is_admin());
    }

    #[test]
    fn test_expired_token_still_decodes() {
        // exp is in 2023; the service is the one to reject it.
        assert!(Session::from_token(&token_for(1, "ADMIN")).is_ok());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            Session::from_token("nao-e-um-jwt"),
            Err(SessionError::Decode(_))
        ));
    }

    #[test]
    fn test_zero_user_id_is_rejected() {
        assert!(matches!(
            Session::from_token(&token_for(0, "USER")),
            Err(SessionError::MissingUserId)
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = token_for(7, "USER");
        let s = Session::from_token(&token).unwrap();
        assert!(!format!("{:?}", s).contains(&token));
    }

    #[test]
    fn test_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("sessao.json"));
        assert!(store.load().unwrap().is_none());

        let s = Session::from_token(&token_for(9, "ADMIN")).unwrap();
        store.save(&s).unwrap();

        let restored = store.load().unwrap().unwrap();
        assert_eq!(restored.user_id(), 9);
        assert!(restored.is_admin());

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessao.json");
        fs::write(&path, "{").unwrap();
        assert!(SessionStore::new(path).load().is_err());
    }
}
