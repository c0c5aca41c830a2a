//! Gateway configuration

use crate::session::Credentials;
use serde::{Deserialize, Serialize};

/// Fixed parameters of the remote command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandParams {
    #[serde(default = "default_cmd_code")]
    pub cmd_code: String,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_start_time")]
    pub start_time: String,

    #[serde(default = "default_remark")]
    pub remark: String,
}

impl Default for CommandParams {
    fn default() -> Self {
        Self {
            cmd_code: default_cmd_code(),
            language_code: default_language_code(),
            start_time: default_start_time(),
            remark: default_remark(),
        }
    }
}

/// Remote service configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Service root, e.g. `http://mes.example.com:8000`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Device states that count as online
    #[serde(default = "default_states")]
    pub states: Vec<String>,

    /// Page size requested for each state query
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub command: CommandParams,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: String::new(),
            password: String::new(),
            states: default_states(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            command: CommandParams::default(),
        }
    }
}

impl GatewayConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("states", &self.states)
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("command", &self.command)
            .finish()
    }
}

// Default value helpers
fn default_base_url() -> String {
    "http://mes.alphaess.com:8000".to_string()
}

fn default_states() -> Vec<String> {
    vec![
        "normal".to_string(),
        "protection".to_string(),
        "fault".to_string(),
    ]
}

fn default_page_size() -> u32 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_cmd_code() -> String {
    "Extra".to_string()
}

fn default_language_code() -> String {
    "zh-CN".to_string()
}

fn default_start_time() -> String {
    "4".to_string()
}

fn default_remark() -> String {
    "6".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.states, vec!["normal", "protection", "fault"]);
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.command.cmd_code, "Extra");
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"username": "ops", "password": "pw", "page_size": 50}"#)
                .unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.credentials().username, "ops");
        assert_eq!(config.command, CommandParams::default());
        assert!(!format!("{:?}", config).contains("\"pw\""));
    }
}
