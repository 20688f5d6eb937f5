//! Audit configuration — TOML file with CLI overrides

use std::path::{Path, PathBuf};

use rf_waapi::{ConnectionConfig, DEFAULT_REALM};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Host running the Wwise authoring tool
    pub host: String,

    /// WAMP realm
    pub realm: String,

    /// Connect and join timeout in milliseconds
    pub timeout_ms: u32,

    /// Per-call deadline in milliseconds; unset waits for as long as the connection lives
    pub call_timeout_ms: Option<u32>,

    /// Show the finished report in the file browser
    pub reveal_report: bool,

    /// Wait for Enter before exiting (the tool usually runs in its own console)
    pub pause_on_exit: bool,

    /// Installer settings
    pub install: InstallConfig,
}

/// Installer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Wwise main menu the command is added under
    pub base_menu: String,

    /// Report directory baked into the installed command, relative to the working directory
    pub log_dir: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            realm: DEFAULT_REALM.to_string(),
            timeout_ms: 5000,
            call_timeout_ms: None,
            reveal_report: true,
            pause_on_exit: false,
            install: InstallConfig::default(),
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            base_menu: "CustomTools".to_string(),
            log_dir: PathBuf::from("output_log"),
        }
    }
}

impl AuditConfig {
    /// Parse from TOML text
    pub fn from_toml(text: &str) -> AuditResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| AuditError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> AuditResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AuditError::io("reading config", path, e))?;
        Self::from_toml(&text)
    }

    /// Load from a file when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> AuditResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> AuditResult<()> {
        if self.host.trim().is_empty() {
            return Err(AuditError::Config("host must not be empty".into()));
        }
        if self.realm.trim().is_empty() {
            return Err(AuditError::Config("realm must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(AuditError::Config("timeout_ms must be greater than 0".into()));
        }
        if self.call_timeout_ms == Some(0) {
            return Err(AuditError::Config("call_timeout_ms must be greater than 0".into()));
        }
        if self.install.base_menu.trim().is_empty() {
            return Err(AuditError::Config("install.base_menu must not be empty".into()));
        }
        Ok(())
    }

    /// WAAPI endpoint for a port
    pub fn waapi_url(&self, port: u16) -> String {
        format!("ws://{}:{}/waapi", self.host, port)
    }

    /// Connection settings for a port
    pub fn connection(&self, port: u16) -> ConnectionConfig {
        ConnectionConfig {
            url: self.waapi_url(port),
            realm: self.realm.clone(),
            timeout_ms: self.timeout_ms,
            call_timeout_ms: self.call_timeout_ms,
        }
    }
}
