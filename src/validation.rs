//! Configuration & Package Validation
//!
//! Rules collect every violation before anyone decides anything; a partial
//! error list would hide problems behind problems.

use crate::config::{GeneratorConfig, IpMode};
use crate::{PACK_PREFIX, VENDOR, VENDOR_PREFIX};

/// One validation rule inspecting the configuration. Rules run in a fixed
/// order so the collected messages are deterministic.
pub trait ConfigRule {
    fn name(&self) -> &'static str;
    fn check(&self, config: &GeneratorConfig) -> Vec<String>;
}

/// Family, RTOS version and output path must all be present.
pub struct RequiredFieldsRule;

impl ConfigRule for RequiredFieldsRule {
    fn name(&self) -> &'static str {
        "required_fields"
    }

    fn check(&self, config: &GeneratorConfig) -> Vec<String> {
        let mut errors = vec![];
        if config.selected_family.is_empty() {
            errors.push("STM32 family must be selected".to_string());
        }
        if config.azure_rtos_version.is_empty() {
            errors.push("Azure RTOS version is required".to_string());
        }
        if config.output_path.is_empty() {
            errors.push("Output path is required".to_string());
        }
        errors
    }
}

/// Every ThreadX numeric field must satisfy its declared bound.
pub struct ThreadXBoundsRule;

impl ConfigRule for ThreadXBoundsRule {
    fn name(&self) -> &'static str {
        "threadx_bounds"
    }

    fn check(&self, config: &GeneratorConfig) -> Vec<String> {
        let tx = &config.advanced_settings.threadx_config;
        let mut errors = vec![];
        if tx.max_threads < 1 || tx.max_threads > 32 {
            errors.push("Maximum threads must be between 1 and 32".to_string());
        }
        if tx.stack_size < 1024 || tx.stack_size > 32768 {
            errors.push("Stack size must be between 1024 and 32768 bytes".to_string());
        }
        if tx.preemption_threshold > 31 {
            errors.push("Preemption threshold must be between 0 and 31".to_string());
        }
        if tx.time_slice > 1000 {
            errors.push("Time slice must be between 0 and 1000 ms".to_string());
        }
        errors
    }
}

/// Runs the rule list and aggregates every violation.
pub struct ConfigValidator {
    rules: Vec<Box<dyn ConfigRule>>,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(RequiredFieldsRule), Box::new(ThreadXBoundsRule)],
        }
    }

    /// Exhaustively collect every violated constraint. Empty means valid.
    pub fn validate_config(&self, config: &GeneratorConfig) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|rule| rule.check(config))
            .collect()
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Which artifact set a produced package must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageMode {
    /// Core header plus manifest only.
    Core,
    /// Complete package as produced by the full pipeline.
    Full(IpMode),
}

impl PackageMode {
    fn required_entries(&self) -> Vec<&'static str> {
        let mut entries = vec!["tx_user.h", ".pdsc"];
        if let PackageMode::Full(ip_mode) = self {
            entries.push("README.md");
            entries.push("LICENSE.md");
            if *ip_mode == IpMode::Middleware {
                entries.push("Middlewares/");
            }
        }
        entries
    }
}

/// Compare the produced artifact names against the required-set table for
/// the mode. One error per missing requirement; substring matching keeps
/// folder prefixes and logical paths equivalent.
pub fn validate_package_structure(files: &[String], mode: PackageMode) -> Vec<String> {
    let mut errors = vec![];
    for entry in mode.required_entries() {
        if !files.iter().any(|file| file.contains(entry)) {
            if entry.ends_with('/') {
                errors.push(format!("Missing required folder: {entry}"));
            } else {
                errors.push(format!("Missing required file: {entry}"));
            }
        }
    }
    errors
}

/// Strict `MAJOR.MINOR.PATCH`; pre-release and build metadata are not
/// valid Azure RTOS release identifiers.
pub fn validate_version_format(version: &str) -> bool {
    match semver::Version::parse(version) {
        Ok(v) => v.pre.is_empty() && v.build.is_empty(),
        Err(_) => false,
    }
}

/// Deterministic pack name: `STMicroelectronics.X-CUBE-AZRTOS-<FAMILY>.<version>`.
pub fn derive_package_name(family: &str, version: &str) -> String {
    format!("{VENDOR}.{PACK_PREFIX}-{family}.{version}")
}

/// Deterministic archive filename for a family/version pair.
pub fn derive_archive_name(family: &str, version: &str) -> String {
    format!("{VENDOR_PREFIX}-{}_v{}.zip", family.to_lowercase(), version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;

    fn valid_config() -> GeneratorConfig {
        GeneratorConfig {
            output_path: "/tmp/out".to_string(),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn valid_config_yields_no_errors() {
        let validator = ConfigValidator::new();
        assert!(validator.validate_config(&valid_config()).is_empty());
    }

    #[test]
    fn empty_fields_yield_exactly_three_errors() {
        let validator = ConfigValidator::new();
        let config = GeneratorConfig {
            azure_rtos_version: String::new(),
            output_path: String::new(),
            selected_family: String::new(),
            ..GeneratorConfig::default()
        };
        let errors = validator.validate_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("family")));
        assert!(errors.iter().any(|e| e.contains("version")));
        assert!(errors.iter().any(|e| e.contains("Output path")));
    }

    #[test]
    fn threadx_bounds_are_collected_not_short_circuited() {
        let validator = ConfigValidator::new();
        let mut config = valid_config();
        let tx = &mut config.advanced_settings.threadx_config;
        tx.max_threads = 0;
        tx.stack_size = 512;
        tx.preemption_threshold = 32;
        tx.time_slice = 2000;
        let errors = validator.validate_config(&config);
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn time_slice_zero_is_valid_input() {
        let validator = ConfigValidator::new();
        let mut config = valid_config();
        config.advanced_settings.threadx_config.time_slice = 0;
        assert!(validator.validate_config(&config).is_empty());
    }

    #[test]
    fn structure_check_reports_one_error_per_missing_entry() {
        let files = vec!["tx_user.h".to_string(), "x.pdsc".to_string()];
        let errors = validate_package_structure(&files, PackageMode::Full(IpMode::Standalone));
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("README.md"));
        assert!(errors[1].contains("LICENSE.md"));
    }

    #[test]
    fn core_mode_requires_header_and_manifest_only() {
        let files = vec![
            "tx_user.h".to_string(),
            "X-CUBE-AZRTOS-stm32h7.pdsc".to_string(),
        ];
        assert!(validate_package_structure(&files, PackageMode::Core).is_empty());
    }

    #[test]
    fn middleware_mode_requires_folder_marker() {
        let files = vec![
            "tx_user.h".to_string(),
            "x.pdsc".to_string(),
            "README.md".to_string(),
            "LICENSE.md".to_string(),
        ];
        let errors = validate_package_structure(&files, PackageMode::Full(IpMode::Middleware));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Middlewares/"));
        assert!(errors[0].contains("folder"));
    }

    #[test]
    fn version_format_is_strict() {
        assert!(validate_version_format("6.2.0"));
        assert!(validate_version_format("0.0.1"));
        assert!(!validate_version_format("6.2"));
        assert!(!validate_version_format("6.2.0-rc1"));
        assert!(!validate_version_format("6.2.0+build5"));
        assert!(!validate_version_format("v6.2.0"));
        assert!(!validate_version_format(""));
    }

    #[test]
    fn package_and_archive_names_are_deterministic() {
        assert_eq!(
            derive_package_name("STM32H7", "3.3.0"),
            "STMicroelectronics.X-CUBE-AZRTOS-STM32H7.3.3.0"
        );
        assert_eq!(
            derive_archive_name("STM32H7", "3.3.0"),
            "st-stm32h7_v3.3.0.zip"
        );
    }
}
