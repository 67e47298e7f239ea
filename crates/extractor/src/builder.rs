use crate::analyzer::ClassDocAnalyzer;
use crate::error::{ExtractorError, Result};
use crate::owner::OwnerResolver;
use crate::paths::{normalize_path, root_label, rooted_relative_path};
use crate::types::{type_key, MappingRecord};
use std::fs;
use std::path::{Path, PathBuf};

/// Label used when the scan root has no final path component
pub const DEFAULT_ROOT_LABEL: &str = "Assets";

/// Turns one source file into at most one [`MappingRecord`]
pub struct MappingBuilder {
    scan_root: PathBuf,
    root_label: String,
    owners: OwnerResolver,
    analyzer: ClassDocAnalyzer,
}

impl MappingBuilder {
    /// Builder for files under `scan_root`; relative paths are labelled with the root's
    /// directory name and owner resolution walks up to the filesystem root.
    pub fn new(scan_root: impl AsRef<Path>) -> Result<Self> {
        let scan_root = scan_root.as_ref().to_path_buf();
        let root_label = root_label(&scan_root).unwrap_or_else(|| DEFAULT_ROOT_LABEL.to_string());
        Ok(Self {
            scan_root,
            root_label,
            owners: OwnerResolver::new(),
            analyzer: ClassDocAnalyzer::new()?,
        })
    }

    /// Override the first segment of every relative path
    #[must_use]
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }

    #[must_use]
    pub fn with_owner_resolver(mut self, owners: OwnerResolver) -> Self {
        self.owners = owners;
        self
    }

    pub fn scan_root(&self) -> &Path {
        &self.scan_root
    }

    /// Record for `path`, or `None` when the file has no documented class.
    ///
    /// Read and parse failures are logged and also yield `None`, so a batch never stops on
    /// one bad file.
    pub fn build(&mut self, path: &Path) -> Option<MappingRecord> {
        match self.try_build(path) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Error processing {}: {e}", path.display());
                None
            }
        }
    }

    /// Like [`build`](Self::build) but surfaces the failure
    pub fn try_build(&mut self, path: &Path) -> Result<Option<MappingRecord>> {
        let content = fs::read_to_string(path)?;
        let Some(class) = self.analyzer.first_documented_class(&content)? else {
            log::debug!("No documented class in {}", path.display());
            return Ok(None);
        };

        let owner = self.owners.resolve(path);
        if owner.trim().is_empty() {
            return Err(ExtractorError::MissingOwner(path.to_path_buf()));
        }

        let relative_path = rooted_relative_path(&self.scan_root, &self.root_label, path)
            .unwrap_or_else(|| normalize_path(&path.to_string_lossy()));
        log::debug!(
            "{relative_path}:{} documents class {} for {owner}",
            class.line,
            class.name
        );

        Ok(Some(MappingRecord {
            summary: class.summary,
            relative_path,
            owner,
            type_key: type_key(class.namespace.as_deref(), &class.name),
        }))
    }
}
