//! Generator Configuration - The Single Input Contract
//!
//! One `GeneratorConfig` value drives one pipeline run. The wire format is
//! camelCase JSON so configurations exported by a front end re-import
//! losslessly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(rename = "azureRTOSVersion")]
    pub azure_rtos_version: String,
    pub output_path: String,
    pub selected_family: String,
    #[serde(default)]
    pub template_path: Option<String>,
    #[serde(default)]
    pub ip_mode: IpMode,
    #[serde(default)]
    pub advanced_settings: AdvancedSettings,
}

impl GeneratorConfig {
    /// Parse a configuration from its JSON export.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Export the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            azure_rtos_version: "6.2.0".to_string(),
            output_path: String::new(),
            selected_family: "STM32F7".to_string(),
            template_path: None,
            ip_mode: IpMode::Standalone,
            advanced_settings: AdvancedSettings::default(),
        }
    }
}

/// Packaging mode for middleware components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpMode {
    Standalone,
    Middleware,
}

impl Default for IpMode {
    fn default() -> Self {
        Self::Standalone
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSettings {
    #[serde(default)]
    pub threadx_config: ThreadXConfig,
    #[serde(default)]
    pub middleware_config: MiddlewareConfig,
    #[serde(default)]
    pub debug_config: DebugConfig,
}

/// ThreadX kernel tuning. Every field carries a declared bound checked by
/// the validator before any synthesis step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadXConfig {
    #[serde(default = "default_max_threads")]
    pub max_threads: u32,
    #[serde(default = "default_stack_size")]
    pub stack_size: u32,
    #[serde(default = "default_preemption_threshold")]
    pub preemption_threshold: u32,
    #[serde(default = "default_time_slice")]
    pub time_slice: u32,
}

fn default_max_threads() -> u32 { 8 }
fn default_stack_size() -> u32 { 1024 }
fn default_preemption_threshold() -> u32 { 4 }
fn default_time_slice() -> u32 { 10 }

impl Default for ThreadXConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
            stack_size: default_stack_size(),
            preemption_threshold: default_preemption_threshold(),
            time_slice: default_time_slice(),
        }
    }
}

/// Independent feature flags, one per Azure RTOS middleware component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddlewareConfig {
    #[serde(default)]
    pub file_x: bool,
    #[serde(default)]
    pub net_x_duo: bool,
    #[serde(default)]
    pub usb_x: bool,
    #[serde(default)]
    pub guix: bool,
}

impl MiddlewareConfig {
    pub fn any_enabled(&self) -> bool {
        self.file_x || self.net_x_duo || self.usb_x || self.guix
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugConfig {
    #[serde(default)]
    pub trace_enabled: bool,
    #[serde(default)]
    pub performance_metrics: bool,
    #[serde(default)]
    pub stack_monitoring: bool,
}

/// Outcome of one public generation operation. Returned by every operation;
/// never thrown across the public boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    pub message: String,
    pub files: Vec<String>,
}

impl GenerationResult {
    pub fn ok(message: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            files,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            files: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_store() {
        let config = GeneratorConfig::default();
        assert_eq!(config.azure_rtos_version, "6.2.0");
        assert_eq!(config.selected_family, "STM32F7");
        assert_eq!(config.ip_mode, IpMode::Standalone);

        let tx = config.advanced_settings.threadx_config;
        assert_eq!(tx.max_threads, 8);
        assert_eq!(tx.stack_size, 1024);
        assert_eq!(tx.preemption_threshold, 4);
        assert_eq!(tx.time_slice, 10);
        assert!(!config.advanced_settings.middleware_config.any_enabled());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = GeneratorConfig::default().to_json().unwrap();
        assert!(json.contains("\"azureRTOSVersion\""));
        assert!(json.contains("\"outputPath\""));
        assert!(json.contains("\"selectedFamily\""));
        assert!(json.contains("\"threadxConfig\""));
        assert!(json.contains("\"maxThreads\""));
        assert!(json.contains("\"netXDuo\""));
        assert!(json.contains("\"traceEnabled\""));
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let mut config = GeneratorConfig::default();
        config.selected_family = "STM32H7".to_string();
        config.ip_mode = IpMode::Middleware;
        config.advanced_settings.middleware_config.file_x = true;
        config.advanced_settings.debug_config.trace_enabled = true;

        let json = config.to_json().unwrap();
        let reimported = GeneratorConfig::from_json(&json).unwrap();
        assert_eq!(config, reimported);
    }

    #[test]
    fn missing_optional_sections_take_defaults() {
        let json = r#"{
            "azureRTOSVersion": "6.2.0",
            "outputPath": "/tmp/out",
            "selectedFamily": "STM32F4"
        }"#;
        let config = GeneratorConfig::from_json(json).unwrap();
        assert_eq!(config.ip_mode, IpMode::Standalone);
        assert_eq!(config.advanced_settings.threadx_config.max_threads, 8);
    }
}
