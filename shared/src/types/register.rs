use serde::{Deserialize, Serialize};

use crate::types::cpf::{add_cpf_mask, is_complete_cpf};

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationData {
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub password: String,
}

/// What the registration screen collects. First and last name are separate
/// inputs but travel as a single `name`.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub surname: String,
    pub cpf: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), RegistrationError> {
        for (field, value) in [
            ("nome", &self.name),
            ("sobrenome", &self.surname),
            ("cpf", &self.cpf),
            ("email", &self.email),
            ("senha", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(RegistrationError::MissingField(field.to_string()));
            }
        }

        if !is_complete_cpf(&self.cpf) {
            return Err(RegistrationError::InvalidCpf);
        }

        if !is_valid_email(self.email.trim()) {
            return Err(RegistrationError::InvalidEmail);
        }

        Ok(())
    }

    /// Validate and build the request body. The CPF is sent masked.
    pub fn into_request(self) -> Result<RegistrationData, RegistrationError> {
        self.validate()?;
        Ok(RegistrationData {
            name: format!("{} {}", self.name.trim(), self.surname.trim()),
            cpf: add_cpf_mask(&self.cpf),
            email: self.email.trim().to_string(),
            password: self.password,
        })
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Error codes for registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    MissingField(String),
    InvalidCpf,
    InvalidEmail,
    InvalidCredentials,
    ConnectionError,
}

impl RegistrationError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidCpf => "INVALID_CPF",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::ConnectionError => "CONNECTION_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::MissingField(field) => format!("Campo obrigatório: {}", field),
            Self::InvalidCpf => "CPF deve conter 11 dígitos".to_string(),
            Self::InvalidEmail => "Formato de e-mail inválido".to_string(),
            Self::InvalidCredentials => "Credenciais inválidas".to_string(),
            Self::ConnectionError => "Erro ao conectar com o servidor".to_string(),
        }
    }
}
