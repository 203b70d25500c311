use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roles the attendance service embeds in its tokens.
///
/// The set is closed: a token carrying any other role is treated as
/// undecodable and never becomes a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Claims carried by the token returned from `POST /auth/login`.
///
/// The client never verifies the signature; it only reads these claims to
/// learn who is logged in and which views to offer. The server stays the
/// authority on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Numeric user id. Sent as `qrCode` when registering attendance.
    pub id: i64,

    pub role: Role,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Standard JWT expiry (Unix timestamp, seconds).
    #[serde(default)]
    pub exp: Option<u64>,

    /// Issued-at (Unix timestamp, seconds).
    #[serde(default)]
    pub iat: Option<u64>,
}
