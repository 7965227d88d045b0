//! Archive Builder - Single-Use Compressed Bundles
//!
//! Accumulates named text artifacts plus a metadata record, then emits one
//! deflate-compressed zip. A builder produces exactly one archive; a
//! duplicate path is a programmer error, never a silent overwrite.

use std::io::{Cursor, Write};

use serde_json::{Map, Value};
use thiserror::Error;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::hashing::{canonical_json, sha256_hex};

/// Logical name of the embedded metadata record.
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("duplicate artifact path: {0}")]
    DuplicatePath(String),

    #[error("zip write error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// The finalized bundle delivered to the caller.
#[derive(Debug, Clone)]
pub struct ArchiveBlob {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// SHA-256 hex of the archive bytes.
    pub checksum: String,
}

#[derive(Debug)]
pub struct ArchiveBuilder {
    entries: Vec<(String, String)>,
    metadata: Map<String, Value>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            entries: vec![],
            metadata: Map::new(),
        }
    }

    /// Append one artifact. Fails if `path` was already added in this
    /// build.
    pub fn add_file(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), ArchiveError> {
        let path = path.into();
        if self.entries.iter().any(|(existing, _)| *existing == path) {
            return Err(ArchiveError::DuplicatePath(path));
        }
        self.entries.push((path, content.into()));
        Ok(())
    }

    /// Merge one key into the metadata record serialized at finalize time.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Artifact names added so far, in insertion order. `metadata.json` is
    /// embedded at finalize time and never appears here.
    pub fn file_names(&self) -> Vec<String> {
        self.entries.iter().map(|(path, _)| path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize all artifacts plus the metadata record into one deflate
    /// zip. Consumes the builder: building a second archive requires a
    /// fresh instance. Entry timestamps are fixed so one input set always
    /// produces the same bytes.
    pub fn finalize(self, filename: &str) -> Result<ArchiveBlob, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for (path, content) in &self.entries {
            writer.start_file(path.as_str(), options)?;
            writer.write_all(content.as_bytes())?;
        }

        writer.start_file(METADATA_FILE, options)?;
        writer.write_all(canonical_json(&Value::Object(self.metadata))?.as_bytes())?;

        let bytes = writer.finish()?.into_inner();
        let checksum = sha256_hex(&bytes);
        Ok(ArchiveBlob {
            filename: filename.to_string(),
            bytes,
            checksum,
        })
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_path_is_rejected() {
        let mut builder = ArchiveBuilder::new();
        builder.add_file("tx_user.h", "a").unwrap();
        let err = builder.add_file("tx_user.h", "b").unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicatePath(path) if path == "tx_user.h"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn finalize_produces_nonempty_deterministic_bytes() {
        let build = || {
            let mut builder = ArchiveBuilder::new();
            builder.add_file("tx_user.h", "#define TX_MAX 8\n").unwrap();
            builder.set_metadata("family", "STM32H7");
            builder.finalize("st-stm32h7_v3.3.0.zip").unwrap()
        };
        let first = build();
        let second = build();
        assert!(!first.bytes.is_empty());
        assert_eq!(first.filename, "st-stm32h7_v3.3.0.zip");
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.checksum, second.checksum);
        assert_eq!(first.checksum, sha256_hex(&first.bytes));
    }

    #[test]
    fn file_names_preserve_insertion_order() {
        let mut builder = ArchiveBuilder::new();
        builder.add_file("b.pdsc", "x").unwrap();
        builder.add_file("a.h", "y").unwrap();
        assert_eq!(builder.file_names(), vec!["b.pdsc", "a.h"]);
    }

    #[test]
    fn archive_contains_metadata_record() {
        let mut builder = ArchiveBuilder::new();
        builder.add_file("README.md", "docs").unwrap();
        builder.set_metadata("generator", "cubepack-core");
        let blob = builder.finalize("out.zip").unwrap();

        // Entry names are stored uncompressed in the zip directory.
        assert!(blob
            .bytes
            .windows(METADATA_FILE.len())
            .any(|w| w == METADATA_FILE.as_bytes()));
    }
}
