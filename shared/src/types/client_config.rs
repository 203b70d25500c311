use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides `api.base_url`.
pub const BASE_URL_ENV: &str = "SISCHECK_SERVICE_URL";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// JSON file holding `{ token, role }` between runs.
    #[serde(default = "default_session_file")]
    pub file: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CameraBackend {
    /// V4L2 devices decoded through `zbarcam`.
    V4l,
    /// Keyboard-wedge scanners or manual entry.
    Keyboard,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct KeyboardDevice {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_camera_backend")]
    pub backend: CameraBackend,
    #[serde(default = "default_zbarcam")]
    pub zbarcam: String,
    #[serde(default = "default_video_root")]
    pub video_root: String,
    /// Devices offered by the keyboard backend. Empty means a single
    /// built-in reader.
    #[serde(default)]
    pub keyboard_devices: Vec<KeyboardDevice>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Where downloaded QR images are written.
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ApiConfig {
    /// Resolve the service URL with `SISCHECK_SERVICE_URL` taking priority
    /// over the config file field. Trailing slashes are dropped.
    pub fn resolved_base_url(&self) -> String {
        std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.base_url.clone())
            .trim()
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: default_session_file(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: default_camera_backend(),
            zbarcam: default_zbarcam(),
            video_root: default_video_root(),
            keyboard_devices: Vec::new(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            log_file: default_log_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_base_url() -> String {
    "http://localhost:3056".to_string()
}

pub fn default_session_file() -> String {
    ".sisweek-session.json".to_string()
}

pub fn default_camera_backend() -> CameraBackend {
    CameraBackend::Keyboard
}

pub fn default_zbarcam() -> String {
    "zbarcam".to_string()
}

pub fn default_video_root() -> String {
    "/sys/class/video4linux".to_string()
}

pub fn default_download_dir() -> String {
    ".".to_string()
}

pub fn default_log_file() -> String {
    "sisweek.log".to_string()
}
