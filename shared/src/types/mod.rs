pub mod activity;
pub mod attendance;
pub mod client_config;
pub mod cpf;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod register;

pub use self::activity::{
    Activity, ActivityDraft, ActivityError, ActivityForm, ActivityUpdate, format_date,
    format_datetime, parse_timestamp,
};
pub use self::attendance::{
    AttendanceRecord, AttendanceRequest, AttendanceResult, AttendanceStatus, attendance_status,
    friendly_error_message,
};
pub use self::client_config::{
    ApiConfig, AppConfig, CameraBackend, CameraConfig, ConfigError, KeyboardDevice, PathsConfig,
    SessionConfig,
};
pub use self::cpf::{CPF_DIGITS, add_cpf_mask, is_complete_cpf, remove_cpf_mask};
pub use self::json_error::{Envelope, ErrorBody};
pub use self::jwt::{JwtClaims, Role};
pub use self::login::{LoginData, LoginError, TokenData};
pub use self::register::{RegistrationData, RegistrationError, RegistrationForm};
