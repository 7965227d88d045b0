//! Content Synthesis - Pure Artifact Derivation
//!
//! Every function here is deterministic in (configuration, descriptor):
//! same inputs, byte-identical artifact. Archive packaging is someone
//! else's job.

use serde_json::{Map, Value};

use crate::config::{GeneratorConfig, IpMode, MiddlewareConfig};
use crate::families::FamilyDescriptor;
use crate::hashing;
use crate::pipeline::GeneratorError;
use crate::templates::TemplateEngine;
use crate::validation::derive_package_name;
use crate::{GENERATOR_NAME, GENERATOR_VERSION, PACK_PREFIX, VENDOR};

/// One generated text file forming part of the output package. Paths are
/// logical, not filesystem-rooted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub content: String,
}

/// Stack overhead added when event tracing is enabled.
pub const TRACE_STACK_OVERHEAD: u32 = 512;
/// Stack overhead added when performance metrics are enabled.
pub const METRICS_STACK_OVERHEAD: u32 = 256;
/// Stack overhead added when stack monitoring is enabled.
pub const MONITORING_STACK_OVERHEAD: u32 = 128;

/// Minimum stack for the target: base value from the primary core class
/// plus one fixed overhead per enabled debug feature. Overheads are
/// additive and feature-independent, so enabling more debug features never
/// decreases the result.
pub fn minimum_stack(config: &GeneratorConfig, descriptor: &FamilyDescriptor) -> u32 {
    let debug = &config.advanced_settings.debug_config;
    let mut stack = descriptor.primary_core().base_stack();
    if debug.trace_enabled {
        stack += TRACE_STACK_OVERHEAD;
    }
    if debug.performance_metrics {
        stack += METRICS_STACK_OVERHEAD;
    }
    if debug.stack_monitoring {
        stack += MONITORING_STACK_OVERHEAD;
    }
    stack
}

/// Timer tick rate derived from the configured time slice. A zero time
/// slice leaves the rate undefined; that is a guarded generation failure,
/// never a non-finite constant in generated text.
pub fn ticks_per_second(config: &GeneratorConfig) -> Result<u32, GeneratorError> {
    let time_slice = config.advanced_settings.threadx_config.time_slice;
    if time_slice == 0 {
        return Err(GeneratorError::Generation {
            operation: "core-config",
            detail: "time slice is 0; the timer tick rate (1000 / timeSlice) is undefined"
                .to_string(),
        });
    }
    Ok(1000 / time_slice)
}

/// The ThreadX user-configuration header.
pub fn core_header(
    config: &GeneratorConfig,
    descriptor: &FamilyDescriptor,
    engine: &TemplateEngine,
) -> Result<Artifact, GeneratorError> {
    let tx = &config.advanced_settings.threadx_config;
    let debug = &config.advanced_settings.debug_config;
    let ticks = ticks_per_second(config)?;

    let mut feature_defines = String::new();
    if descriptor.features.fpu {
        feature_defines.push_str("#define TX_ENABLE_FPU_SUPPORT\n");
    }
    if descriptor.features.trust_zone {
        feature_defines.push_str("#define TX_SECURE_STACK_ENABLE\n");
    }

    let mut debug_defines = String::new();
    if debug.trace_enabled {
        debug_defines.push_str("#define TX_ENABLE_EVENT_TRACE\n");
    }
    if debug.performance_metrics {
        debug_defines.push_str("#define TX_EXECUTION_PROFILE_ENABLE\n");
    }
    if debug.stack_monitoring {
        debug_defines.push_str("#define TX_ENABLE_STACK_CHECKING\n");
    }

    let content = engine.render(
        "tx_user",
        &[
            ("family", descriptor.name.to_string()),
            ("version", config.azure_rtos_version.clone()),
            ("max_threads", tx.max_threads.to_string()),
            ("stack_size", tx.stack_size.to_string()),
            ("minimum_stack", minimum_stack(config, descriptor).to_string()),
            ("preemption_threshold", tx.preemption_threshold.to_string()),
            ("ticks_per_second", ticks.to_string()),
            ("feature_defines", feature_defines),
            ("debug_defines", debug_defines),
        ],
    )?;

    Ok(Artifact {
        path: "tx_user.h".to_string(),
        content,
    })
}

/// The middleware components in their one fixed declared order. Keyword
/// and component lists in the manifest follow this order regardless of how
/// the underlying flags were set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Middleware {
    FileX,
    NetXDuo,
    UsbX,
    Guix,
}

pub const MIDDLEWARE_ORDER: [Middleware; 4] = [
    Middleware::FileX,
    Middleware::NetXDuo,
    Middleware::UsbX,
    Middleware::Guix,
];

impl Middleware {
    pub fn enabled(&self, flags: &MiddlewareConfig) -> bool {
        match self {
            Middleware::FileX => flags.file_x,
            Middleware::NetXDuo => flags.net_x_duo,
            Middleware::UsbX => flags.usb_x,
            Middleware::Guix => flags.guix,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Middleware::FileX => "FileX",
            Middleware::NetXDuo => "NetX Duo",
            Middleware::UsbX => "USBX",
            Middleware::Guix => "GUIX",
        }
    }

    pub fn header_file(&self) -> &'static str {
        match self {
            Middleware::FileX => "fx_user.h",
            Middleware::NetXDuo => "nx_user.h",
            Middleware::UsbX => "ux_user.h",
            Middleware::Guix => "gx_user.h",
        }
    }

    fn template_name(&self) -> &'static str {
        match self {
            Middleware::FileX => "fx_user",
            Middleware::NetXDuo => "nx_user",
            Middleware::UsbX => "ux_user",
            Middleware::Guix => "gx_user",
        }
    }

    fn component_class(&self) -> &'static str {
        match self {
            Middleware::FileX => "File System",
            Middleware::NetXDuo => "Network",
            Middleware::UsbX => "USB",
            Middleware::Guix => "Graphics",
        }
    }

    fn component_group(&self) -> &'static str {
        match self {
            Middleware::FileX => "FileX",
            Middleware::NetXDuo => "NetX Duo",
            Middleware::UsbX => "USBX",
            Middleware::Guix => "GUIX",
        }
    }
}

fn enabled_middleware(config: &GeneratorConfig) -> Vec<Middleware> {
    MIDDLEWARE_ORDER
        .iter()
        .copied()
        .filter(|mw| mw.enabled(&config.advanced_settings.middleware_config))
        .collect()
}

/// One user-configuration header per enabled middleware flag, in declared
/// order. Disabled flags produce no artifact. In middleware IP mode the
/// headers live under `Middlewares/`.
pub fn middleware_headers(
    config: &GeneratorConfig,
    engine: &TemplateEngine,
) -> Result<Vec<Artifact>, GeneratorError> {
    let prefix = match config.ip_mode {
        IpMode::Standalone => "",
        IpMode::Middleware => "Middlewares/",
    };

    let mut artifacts = vec![];
    for mw in enabled_middleware(config) {
        let content = engine.render(
            mw.template_name(),
            &[("version", config.azure_rtos_version.clone())],
        )?;
        artifacts.push(Artifact {
            path: format!("{prefix}{}", mw.header_file()),
            content,
        });
    }
    Ok(artifacts)
}

/// The pdsc package manifest. Keyword and component ordering is fixed by
/// `MIDDLEWARE_ORDER` to guarantee byte-reproducible output.
pub fn manifest(
    config: &GeneratorConfig,
    descriptor: &FamilyDescriptor,
    engine: &TemplateEngine,
) -> Result<Artifact, GeneratorError> {
    let version = &config.azure_rtos_version;
    let enabled = enabled_middleware(config);

    let mut keywords = String::new();
    for keyword in ["Azure RTOS", "ThreadX", descriptor.name]
        .into_iter()
        .chain(enabled.iter().map(|mw| mw.display_name()))
    {
        keywords.push_str(&format!("    <keyword>{keyword}</keyword>\n"));
    }

    let mut components = format!(
        "    <component Cclass=\"RTOS\" Cgroup=\"ThreadX\" Cversion=\"{version}\"/>\n"
    );
    for mw in &enabled {
        components.push_str(&format!(
            "    <component Cclass=\"{}\" Cgroup=\"{}\" Cversion=\"{version}\"/>\n",
            mw.component_class(),
            mw.component_group(),
        ));
    }

    let content = engine.render(
        "pdsc",
        &[
            ("vendor", VENDOR.to_string()),
            ("name", format!("{PACK_PREFIX}-{}", descriptor.name)),
            (
                "description",
                format!("Azure RTOS software expansion for {}", descriptor.name),
            ),
            ("version", version.clone()),
            (
                "release_note",
                format!("Azure RTOS {version} for {}", descriptor.name),
            ),
            ("keywords", keywords),
            ("components", components),
        ],
    )?;

    Ok(Artifact {
        path: format!("{PACK_PREFIX}-{}.pdsc", descriptor.name.to_lowercase()),
        content,
    })
}

fn list_section(items: &[&'static str]) -> String {
    items.iter().map(|item| format!("- {item}\n")).collect()
}

/// README interpolating family, version and descriptor-provided lists.
/// Omitted lists render as empty sections rather than failing.
pub fn readme(
    config: &GeneratorConfig,
    descriptor: &FamilyDescriptor,
    engine: &TemplateEngine,
) -> Result<Artifact, GeneratorError> {
    let cores = descriptor
        .cores
        .iter()
        .map(|core| core.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let content = engine.render(
        "readme",
        &[
            (
                "package_name",
                derive_package_name(descriptor.name, &config.azure_rtos_version),
            ),
            ("family", descriptor.name.to_string()),
            ("version", config.azure_rtos_version.clone()),
            ("cores", cores),
            ("boards", list_section(&descriptor.boards)),
            ("toolchains", list_section(&descriptor.toolchains)),
            ("applications", list_section(&descriptor.applications)),
        ],
    )?;

    Ok(Artifact {
        path: "README.md".to_string(),
        content,
    })
}

/// License text for the generated package.
pub fn license(config: &GeneratorConfig, descriptor: &FamilyDescriptor) -> Artifact {
    let content = format!(
        "Copyright (c) {VENDOR}.\nAll rights reserved.\n\n\
         This software component ({PACK_PREFIX}-{family}, Azure RTOS {version})\n\
         is licensed under the terms of the source-available license agreement\n\
         shipped with the expansion package. You may not use these files except\n\
         in compliance with that agreement.\n",
        family = descriptor.name,
        version = config.azure_rtos_version,
    );
    Artifact {
        path: "LICENSE.md".to_string(),
        content,
    }
}

/// The metadata record embedded in the archive as `metadata.json`. Carries
/// generator identity and a configuration fingerprint; no timestamps, so a
/// given configuration archives identically every time.
pub fn metadata(config: &GeneratorConfig) -> Result<Map<String, Value>, GeneratorError> {
    let mut map = Map::new();
    map.insert("generator".to_string(), Value::from(GENERATOR_NAME));
    map.insert(
        "generatorVersion".to_string(),
        Value::from(GENERATOR_VERSION),
    );
    map.insert(
        "azureRtosVersion".to_string(),
        Value::from(config.azure_rtos_version.as_str()),
    );
    map.insert(
        "family".to_string(),
        Value::from(config.selected_family.as_str()),
    );
    map.insert(
        "configFingerprint".to_string(),
        Value::from(hashing::fingerprint(config)?),
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::{Family, FamilyCatalog};

    fn fixture(family: &str) -> (GeneratorConfig, FamilyDescriptor) {
        let catalog = FamilyCatalog::new();
        let config = GeneratorConfig {
            selected_family: family.to_string(),
            output_path: "/tmp/out".to_string(),
            ..GeneratorConfig::default()
        };
        let (_, descriptor) = catalog.resolve(family).unwrap();
        (config, descriptor.clone())
    }

    #[test]
    fn minimum_stack_is_monotone_in_debug_flags() {
        let (mut config, descriptor) = fixture("STM32H7");
        let mut last = 0;
        for (trace, metrics, monitoring) in [
            (false, false, false),
            (true, false, false),
            (true, true, false),
            (true, true, true),
        ] {
            let debug = &mut config.advanced_settings.debug_config;
            debug.trace_enabled = trace;
            debug.performance_metrics = metrics;
            debug.stack_monitoring = monitoring;
            let stack = minimum_stack(&config, &descriptor);
            assert!(stack >= last);
            last = stack;
        }
        assert_eq!(
            last,
            2048 + TRACE_STACK_OVERHEAD + METRICS_STACK_OVERHEAD + MONITORING_STACK_OVERHEAD
        );
    }

    #[test]
    fn higher_end_core_raises_base_stack() {
        let (config_f0, descriptor_f0) = fixture("STM32F0");
        let (config_h7, descriptor_h7) = fixture("STM32H7");
        assert!(
            minimum_stack(&config_f0, &descriptor_f0) < minimum_stack(&config_h7, &descriptor_h7)
        );
    }

    #[test]
    fn zero_time_slice_is_a_guarded_error() {
        let (mut config, descriptor) = fixture("STM32F4");
        config.advanced_settings.threadx_config.time_slice = 0;
        let engine = TemplateEngine::new();
        let err = core_header(&config, &descriptor, &engine).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::Generation { operation: "core-config", .. }
        ));
    }

    fn define_value(content: &str, name: &str) -> String {
        content
            .lines()
            .find(|line| line.contains(name))
            .and_then(|line| line.split_whitespace().last())
            .unwrap_or_else(|| panic!("no define for {name}"))
            .to_string()
    }

    #[test]
    fn core_header_embeds_derived_constants() {
        let (mut config, descriptor) = fixture("STM32H7");
        config.advanced_settings.debug_config.trace_enabled = true;
        let engine = TemplateEngine::new();
        let artifact = core_header(&config, &descriptor, &engine).unwrap();
        assert_eq!(artifact.path, "tx_user.h");
        assert_eq!(define_value(&artifact.content, "TX_THREAD_MAX_COUNT"), "8");
        assert_eq!(
            define_value(&artifact.content, "TX_TIMER_TICKS_PER_SECOND"),
            "100"
        );
        assert_eq!(
            define_value(&artifact.content, "TX_MINIMUM_STACK"),
            (2048 + TRACE_STACK_OVERHEAD).to_string()
        );
        assert!(artifact.content.contains("TX_ENABLE_EVENT_TRACE"));
        assert!(artifact.content.contains("TX_ENABLE_FPU_SUPPORT"));
        assert!(artifact.content.contains("TX_SECURE_STACK_ENABLE"));
        assert!(!artifact.content.contains("inf"));
        assert!(!artifact.content.contains("NaN"));
    }

    #[test]
    fn middleware_headers_follow_declared_order() {
        let (mut config, _) = fixture("STM32F7");
        let flags = &mut config.advanced_settings.middleware_config;
        flags.guix = true;
        flags.file_x = true;
        let engine = TemplateEngine::new();
        let artifacts = middleware_headers(&config, &engine).unwrap();
        let paths: Vec<_> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["fx_user.h", "gx_user.h"]);
    }

    #[test]
    fn middleware_mode_prefixes_header_paths() {
        let (mut config, _) = fixture("STM32F7");
        config.ip_mode = IpMode::Middleware;
        config.advanced_settings.middleware_config.usb_x = true;
        let engine = TemplateEngine::new();
        let artifacts = middleware_headers(&config, &engine).unwrap();
        assert_eq!(artifacts[0].path, "Middlewares/ux_user.h");
    }

    #[test]
    fn disabled_flags_produce_no_artifact() {
        let (config, _) = fixture("STM32F7");
        let engine = TemplateEngine::new();
        assert!(middleware_headers(&config, &engine).unwrap().is_empty());
    }

    #[test]
    fn manifest_orders_keywords_and_components() {
        let (mut config, descriptor) = fixture("STM32H7");
        let flags = &mut config.advanced_settings.middleware_config;
        flags.guix = true;
        flags.file_x = true;
        let engine = TemplateEngine::new();
        let artifact = manifest(&config, &descriptor, &engine).unwrap();

        assert_eq!(artifact.path, "X-CUBE-AZRTOS-stm32h7.pdsc");
        assert!(artifact.content.contains("X-CUBE-AZRTOS-STM32H7"));
        let filex = artifact.content.find("FileX").unwrap();
        let guix = artifact.content.find("GUIX").unwrap();
        assert!(filex < guix);
        assert!(!artifact.content.contains("NetX Duo"));
        assert!(!artifact.content.contains("USBX"));
    }

    #[test]
    fn readme_renders_empty_sections_for_omitted_lists() {
        let (mut config, descriptor) = fixture("STM32F0");
        config.selected_family = "STM32F0".to_string();
        let engine = TemplateEngine::new();
        let artifact = readme(&config, &descriptor, &engine).unwrap();
        assert!(artifact.content.contains("## Supported boards"));
        assert!(!artifact.content.contains("{{boards}}"));
        assert!(artifact.content.contains("STM32F0"));
    }

    #[test]
    fn metadata_has_no_timestamp() {
        let (config, _) = fixture("STM32H7");
        let map = metadata(&config).unwrap();
        assert_eq!(map["generator"], "cubepack-core");
        assert_eq!(map["family"], "STM32H7");
        assert!(map.keys().all(|k| !k.to_lowercase().contains("time")));
        assert!(map.keys().all(|k| !k.to_lowercase().contains("date")));
    }
}
