//! Generation Pipeline - Single Entry Point
//!
//! CRITICAL: construction MUST validate the configuration. No artifact can
//! exist for a configuration that never passed validation, and no expected
//! failure crosses a public operation as anything but a `GenerationResult`.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::archive::{ArchiveBlob, ArchiveBuilder, ArchiveError};
use crate::config::{GenerationResult, GeneratorConfig};
use crate::families::{Family, FamilyCatalog, FamilyDescriptor};
use crate::synthesis;
use crate::templates::TemplateEngine;
use crate::validation::{self, ConfigValidator, PackageMode};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The configuration violates declared constraints. Carries every
    /// violation, not just the first.
    #[error("configuration invalid: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("unknown family: {0}")]
    UnknownFamily(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// The produced artifact set misses a packaging requirement.
    #[error("package structure invalid: {}", .0.join("; "))]
    InvalidStructure(Vec<String>),

    /// Unexpected failure inside a synthesis step, with the operation
    /// name attached.
    #[error("generation failed in {operation}: {detail}")]
    Generation {
        operation: &'static str,
        detail: String,
    },

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Caller-visible generation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPhase {
    Idle,
    Generating,
    Success,
    Error,
}

/// Status of the pipeline as seen by the caller: phase, last message, a
/// monotone progress percentage and the timestamped log lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatus {
    pub phase: GenerationPhase,
    pub message: String,
    pub progress: u8,
    pub logs: Vec<String>,
}

impl GenerationStatus {
    fn idle() -> Self {
        Self {
            phase: GenerationPhase::Idle,
            message: String::new(),
            progress: 0,
            logs: vec![],
        }
    }

    fn begin(&mut self, message: &str) {
        self.phase = GenerationPhase::Generating;
        self.message = message.to_string();
        self.progress = 0;
        self.log(message);
    }

    fn log(&mut self, line: &str) {
        self.logs
            .push(format!("[{}] {line}", Utc::now().to_rfc3339()));
    }

    /// Progress never goes backwards within a run; values above 100 are
    /// clamped.
    fn advance(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    fn succeed(&mut self, message: &str) {
        self.advance(100);
        self.phase = GenerationPhase::Success;
        self.message = message.to_string();
        self.log(message);
    }

    fn fail(&mut self, message: &str) {
        self.phase = GenerationPhase::Error;
        self.message = message.to_string();
        self.log(message);
    }

    /// The only way back to `Idle`.
    fn reset(&mut self) {
        *self = Self::idle();
    }
}

/// The generation pipeline: composes catalog, templates, synthesis and
/// archive packaging into the four public operations.
#[derive(Debug)]
pub struct GenerationPipeline {
    config: GeneratorConfig,
    family: Family,
    descriptor: FamilyDescriptor,
    engine: TemplateEngine,
    builder: Option<ArchiveBuilder>,
    archive: Option<ArchiveBlob>,
    status: GenerationStatus,
    run_id: Uuid,
}

impl GenerationPipeline {
    /// Validates the configuration and resolves the family before any
    /// artifact exists. Every violation is reported at once.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let violations = ConfigValidator::new().validate_config(&config);
        if !violations.is_empty() {
            return Err(GeneratorError::InvalidConfig(violations));
        }

        let catalog = FamilyCatalog::new();
        let (family, descriptor) = catalog
            .resolve(&config.selected_family)
            .ok_or_else(|| GeneratorError::UnknownFamily(config.selected_family.clone()))?;
        let descriptor = descriptor.clone();

        let mut engine = TemplateEngine::new();
        if let Some(dir) = &config.template_path {
            match engine.load_from_dir(std::path::Path::new(dir)) {
                Ok(loaded) => info!(dir = %dir, loaded, "loaded custom templates"),
                Err(e) => {
                    warn!(dir = %dir, error = %e, "template directory unreadable; using defaults")
                }
            }
        }

        Ok(Self {
            config,
            family,
            descriptor,
            engine,
            builder: Some(ArchiveBuilder::new()),
            archive: None,
            status: GenerationStatus::idle(),
            run_id: Uuid::new_v4(),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn descriptor(&self) -> &FamilyDescriptor {
        &self.descriptor
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    /// The finalized archive, if `generate_all` succeeded. Taking it leaves
    /// the pipeline without one until the next successful full run.
    pub fn take_archive(&mut self) -> Option<ArchiveBlob> {
        self.archive.take()
    }

    /// Explicit reset back to `Idle` with a fresh accumulator; the only
    /// way to build a second archive from the same pipeline.
    pub fn reset(&mut self) {
        self.status.reset();
        self.builder = Some(ArchiveBuilder::new());
        self.archive = None;
    }

    /// Generate the pdsc package manifest.
    pub fn generate_manifest(&mut self) -> GenerationResult {
        self.status.begin("Generating PDSC manifest");
        match self.try_manifest() {
            Ok(files) => self.finish_ok("PDSC file generated successfully", files),
            Err(e) => self.finish_err("pdsc", &e),
        }
    }

    /// Generate the core RTOS configuration header.
    pub fn generate_core_config(&mut self) -> GenerationResult {
        self.status.begin("Generating core configuration");
        match self.try_core_config() {
            Ok(files) => self.finish_ok("Core configuration generated successfully", files),
            Err(e) => self.finish_err("core-config", &e),
        }
    }

    /// Generate one header per enabled middleware component.
    pub fn generate_middleware_config(&mut self) -> GenerationResult {
        self.status.begin("Generating middleware configuration");
        match self.try_middleware_config() {
            Ok(files) if files.is_empty() => {
                self.finish_ok("No middleware components enabled", files)
            }
            Ok(files) => {
                let message = format!("{} middleware file(s) generated successfully", files.len());
                self.finish_ok(&message, files)
            }
            Err(e) => self.finish_err("middleware-config", &e),
        }
    }

    /// Run the full pipeline: manifest, core header, middleware headers,
    /// documentation, structural validation, then archive finalization.
    /// The first failing step aborts the rest.
    pub fn generate_all(&mut self) -> GenerationResult {
        self.status.begin("Generating complete package");
        match self.try_all() {
            Ok(files) => self.finish_ok("Complete package generated successfully", files),
            Err(e) => self.finish_err("generate-all", &e),
        }
    }

    fn try_manifest(&mut self) -> Result<Vec<String>, GeneratorError> {
        let artifact = synthesis::manifest(&self.config, &self.descriptor, &self.engine)?;
        self.add_artifact(artifact)
    }

    fn try_core_config(&mut self) -> Result<Vec<String>, GeneratorError> {
        let artifact = synthesis::core_header(&self.config, &self.descriptor, &self.engine)?;
        self.add_artifact(artifact)
    }

    fn try_middleware_config(&mut self) -> Result<Vec<String>, GeneratorError> {
        let artifacts = synthesis::middleware_headers(&self.config, &self.engine)?;
        let mut files = vec![];
        for artifact in artifacts {
            files.extend(self.add_artifact(artifact)?);
        }
        Ok(files)
    }

    fn try_all(&mut self) -> Result<Vec<String>, GeneratorError> {
        let mut files = vec![];

        files.extend(self.try_manifest()?);
        self.step_done(20, "PDSC manifest ready");

        files.extend(self.try_core_config()?);
        self.step_done(40, "Core configuration ready");

        files.extend(self.try_middleware_config()?);
        self.step_done(55, "Middleware configuration ready");

        let readme = synthesis::readme(&self.config, &self.descriptor, &self.engine)?;
        files.extend(self.add_artifact(readme)?);
        let license = synthesis::license(&self.config, &self.descriptor);
        files.extend(self.add_artifact(license)?);
        self.step_done(70, "Documentation ready");

        let produced = self
            .builder
            .as_ref()
            .map(ArchiveBuilder::file_names)
            .unwrap_or_default();
        let violations =
            validation::validate_package_structure(&produced, PackageMode::Full(self.config.ip_mode));
        if !violations.is_empty() {
            return Err(GeneratorError::InvalidStructure(violations));
        }
        self.step_done(85, "Package structure validated");

        let mut builder = self.take_builder()?;
        for (key, value) in synthesis::metadata(&self.config)? {
            builder.set_metadata(key, value);
        }
        let filename = validation::derive_archive_name(
            self.descriptor.name,
            &self.config.azure_rtos_version,
        );
        let blob = builder.finalize(&filename)?;
        info!(
            run = %self.run_id,
            filename = %blob.filename,
            checksum = %blob.checksum,
            bytes = blob.bytes.len(),
            "archive finalized"
        );
        self.status.log(&format!("Archive {} finalized", blob.filename));
        self.archive = Some(blob);

        Ok(files)
    }

    fn add_artifact(&mut self, artifact: synthesis::Artifact) -> Result<Vec<String>, GeneratorError> {
        let builder = self.builder.as_mut().ok_or(GeneratorError::Generation {
            operation: "archive",
            detail: "archive already finalized; reset the pipeline to generate again".to_string(),
        })?;
        builder.add_file(artifact.path.clone(), artifact.content)?;
        Ok(vec![artifact.path])
    }

    fn take_builder(&mut self) -> Result<ArchiveBuilder, GeneratorError> {
        self.builder.take().ok_or(GeneratorError::Generation {
            operation: "archive",
            detail: "archive already finalized; reset the pipeline to generate again".to_string(),
        })
    }

    fn step_done(&mut self, progress: u8, message: &str) {
        self.status.advance(progress);
        self.status.log(message);
        info!(run = %self.run_id, progress, "{message}");
    }

    fn finish_ok(&mut self, message: &str, files: Vec<String>) -> GenerationResult {
        self.status.succeed(message);
        GenerationResult::ok(message, files)
    }

    fn finish_err(&mut self, operation: &str, error: &GeneratorError) -> GenerationResult {
        let message = format!("Failed to generate {operation}: {error}");
        warn!(run = %self.run_id, operation, error = %error, "generation step failed");
        self.status.fail(&message);
        GenerationResult::failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IpMode;

    fn valid_config() -> GeneratorConfig {
        GeneratorConfig {
            output_path: "/tmp/out".to_string(),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn construction_rejects_invalid_config_with_all_violations() {
        let config = GeneratorConfig {
            azure_rtos_version: String::new(),
            output_path: String::new(),
            selected_family: String::new(),
            ..GeneratorConfig::default()
        };
        let err = GenerationPipeline::new(config).unwrap_err();
        match err {
            GeneratorError::InvalidConfig(violations) => assert_eq!(violations.len(), 3),
            other => panic!("expected InvalidConfig, got {other}"),
        }
    }

    #[test]
    fn construction_rejects_unknown_family() {
        let config = GeneratorConfig {
            selected_family: "STM32Z1".to_string(),
            ..valid_config()
        };
        let err = GenerationPipeline::new(config).unwrap_err();
        assert!(matches!(err, GeneratorError::UnknownFamily(f) if f == "STM32Z1"));
    }

    #[test]
    fn status_starts_idle_and_resets_explicitly() {
        let mut pipeline = GenerationPipeline::new(valid_config()).unwrap();
        assert_eq!(pipeline.status().phase, GenerationPhase::Idle);

        let result = pipeline.generate_manifest();
        assert!(result.success);
        assert_eq!(pipeline.status().phase, GenerationPhase::Success);
        assert_eq!(pipeline.status().progress, 100);
        assert!(!pipeline.status().logs.is_empty());

        pipeline.reset();
        assert_eq!(pipeline.status().phase, GenerationPhase::Idle);
        assert_eq!(pipeline.status().progress, 0);
        assert!(pipeline.status().logs.is_empty());
    }

    #[test]
    fn progress_is_monotone() {
        let mut status = GenerationStatus::idle();
        status.begin("run");
        status.advance(40);
        status.advance(20);
        assert_eq!(status.progress, 40);
        status.advance(120);
        assert_eq!(status.progress, 100);
    }

    #[test]
    fn second_manifest_generation_fails_on_duplicate_path() {
        let mut pipeline = GenerationPipeline::new(valid_config()).unwrap();
        assert!(pipeline.generate_manifest().success);
        let second = pipeline.generate_manifest();
        assert!(!second.success);
        assert!(second.message.contains("duplicate artifact path"));
        assert_eq!(pipeline.status().phase, GenerationPhase::Error);
    }

    #[test]
    fn middleware_config_with_nothing_enabled_succeeds_empty() {
        let mut pipeline = GenerationPipeline::new(valid_config()).unwrap();
        let result = pipeline.generate_middleware_config();
        assert!(result.success);
        assert!(result.files.is_empty());
    }

    #[test]
    fn generate_all_in_middleware_mode_without_components_fails_structure() {
        let config = GeneratorConfig {
            ip_mode: IpMode::Middleware,
            ..valid_config()
        };
        let mut pipeline = GenerationPipeline::new(config).unwrap();
        let result = pipeline.generate_all();
        assert!(!result.success);
        assert!(result.message.contains("Middlewares/"));
        assert!(pipeline.take_archive().is_none());
    }

    #[test]
    fn generation_after_finalize_requires_reset() {
        let mut pipeline = GenerationPipeline::new(valid_config()).unwrap();
        assert!(pipeline.generate_all().success);
        assert!(pipeline.take_archive().is_some());

        let again = pipeline.generate_manifest();
        assert!(!again.success);
        assert!(again.message.contains("archive already finalized"));

        pipeline.reset();
        assert!(pipeline.generate_manifest().success);
    }
}
