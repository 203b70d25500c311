use serde::{Deserialize, Serialize};

use crate::types::cpf::remove_cpf_mask;

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
///
/// The service accepts either a CPF or an e-mail as the identifier; exactly
/// one of the two is serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
}

impl LoginData {
    /// Build the body from whatever the user typed in the identifier field.
    /// Anything with an `@` is an e-mail; everything else is a CPF and loses
    /// its mask.
    pub fn from_identifier(identifier: &str, password: &str) -> Self {
        let identifier = identifier.trim();
        if identifier.contains('@') {
            Self {
                cpf: None,
                email: Some(identifier.to_string()),
                password: password.to_string(),
            }
        } else {
            Self {
                cpf: Some(remove_cpf_mask(identifier)),
                email: None,
                password: password.to_string(),
            }
        }
    }

    pub fn validate(&self) -> Result<(), LoginError> {
        let identifier = self.email.as_deref().or(self.cpf.as_deref()).unwrap_or("");
        if identifier.is_empty() {
            return Err(LoginError::MissingField("email".to_string()));
        }
        if self.password.is_empty() {
            return Err(LoginError::MissingField("senha".to_string()));
        }
        Ok(())
    }
}

/// Payload inside the `data` envelope of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Login errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    InvalidCredentials,
    MissingField(String),
    InvalidToken,
    ConnectionError,
}

impl LoginError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::ConnectionError => "CONNECTION_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Credenciais inválidas".to_string(),
            Self::MissingField(field) => format!("Campo obrigatório: {}", field),
            Self::InvalidToken => "Token de acesso inválido. Tente novamente.".to_string(),
            Self::ConnectionError => "Erro ao conectar com o servidor".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_with_at_is_email() {
        let d = LoginData::from_identifier(" ana@ufpa.br ", "x");
        assert_eq!(d.email.as_deref(), Some("ana@ufpa.br"));
        assert!(d.cpf.is_none());
    }

    #[test]
    fn test_identifier_without_at_is_unmasked_cpf() {
        let d = LoginData::from_identifier("123.456.789-01", "x");
        assert_eq!(d.cpf.as_deref(), Some("12345678901"));
        assert!(d.email.is_none());
    }

    #[test]
    fn test_validate_requires_both_fields() {
        assert!(LoginData::from_identifier("", "x").validate().is_err());
        assert!(LoginData::from_identifier("a@b.c", "").validate().is_err());
        assert!(LoginData::from_identifier("a@b.c", "pw").validate().is_ok());
    }
}
