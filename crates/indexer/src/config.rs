use crate::error::{IndexerError, Result};
use script_summaries_extractor::{normalize_path, root_label, DEFAULT_ROOT_LABEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the project directory
pub const CONFIG_FILE_NAME: &str = "script-summaries.toml";

/// Settings for documentation generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummariesConfig {
    /// Directory holding the sources, relative to the project directory unless absolute
    pub scan_root: PathBuf,

    /// First segment of every relative path (defaults to the scan root's directory name)
    pub root_label: Option<String>,

    /// Artifact directory, relative to the project directory unless absolute
    pub output_dir: PathBuf,

    /// Include-subpaths under `scan_root`; nothing is generated while this is empty
    pub scan_directories: Vec<String>,

    /// Regenerate when the watcher reports source changes
    pub auto_generate_on_reload: bool,

    /// Maximum summary lines shown by display surfaces (0 = all)
    pub tooltip_line_length: usize,

    pub enable_debug_logging: bool,

    /// Honor `.gitignore` files while scanning
    pub respect_gitignore: bool,
}

impl Default for SummariesConfig {
    fn default() -> Self {
        Self {
            scan_root: PathBuf::from("Assets"),
            root_label: None,
            output_dir: PathBuf::from("Library/ScriptSummaries"),
            scan_directories: Vec::new(),
            auto_generate_on_reload: false,
            tooltip_line_length: 0,
            enable_debug_logging: false,
            respect_gitignore: false,
        }
    }
}

impl SummariesConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Load `<project_dir>/script-summaries.toml` or defaults
    pub fn for_project(project_dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_or_default(project_dir.as_ref().join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_root.as_os_str().is_empty() {
            return Err(IndexerError::InvalidConfig(
                "scan_root must not be empty".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(IndexerError::InvalidConfig(
                "output_dir must not be empty".to_string(),
            ));
        }
        if let Some(label) = &self.root_label {
            if label.trim().is_empty() || label.contains(['/', '\\']) {
                return Err(IndexerError::InvalidConfig(format!(
                    "root_label must be a single non-empty path segment, got {label:?}"
                )));
            }
        }
        Ok(())
    }

    /// Resolve every configured path against `project_dir`
    pub fn resolve(&self, project_dir: impl AsRef<Path>) -> ResolvedPaths {
        let project_dir = project_dir.as_ref().to_path_buf();
        let scan_root = project_dir.join(&self.scan_root);
        let output_dir = project_dir.join(&self.output_dir);
        let root_label = self
            .root_label
            .clone()
            .or_else(|| root_label(&scan_root))
            .unwrap_or_else(|| DEFAULT_ROOT_LABEL.to_string());

        ResolvedPaths {
            project_dir,
            scan_root,
            output_dir,
            root_label,
        }
    }
}

/// Absolute locations derived from a [`SummariesConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub project_dir: PathBuf,
    pub scan_root: PathBuf,
    pub output_dir: PathBuf,
    pub root_label: String,
}

impl ResolvedPaths {
    /// Existing directories for the configured include-subpaths.
    ///
    /// Entries may be written relative to the scan root (`Scripts`) or with the root label in
    /// front (`Assets/Scripts`). Blank entries and entries that are not directories are
    /// dropped with a warning. An empty result means "nothing to scan".
    pub fn scan_directories(&self, configured: &[String]) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for raw in configured {
            if raw.trim().is_empty() {
                log::warn!("Ignoring blank scan directory entry");
                continue;
            }

            let subpath = self.strip_label(raw);
            let dir = if subpath.is_empty() {
                self.scan_root.clone()
            } else {
                self.scan_root.join(subpath)
            };
            if !dir.is_dir() {
                log::warn!(
                    "Ignoring scan directory {raw:?}: {} is not a directory",
                    dir.display()
                );
                continue;
            }
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// `Assets/Scripts` → `Scripts`, `Assets` → empty, `Scripts` unchanged
    fn strip_label(&self, raw: &str) -> String {
        let normalized = normalize_path(raw.trim());
        let trimmed = normalized.trim_matches('/');
        match trimmed.split_once('/') {
            Some((head, rest)) if head.eq_ignore_ascii_case(&self.root_label) => rest.to_string(),
            None if trimmed.eq_ignore_ascii_case(&self.root_label) => String::new(),
            _ => trimmed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_file_is_missing() {
        let temp = tempdir().unwrap();
        let config = SummariesConfig::for_project(temp.path()).unwrap();
        assert_eq!(config, SummariesConfig::default());
        assert!(config.scan_directories.is_empty());
        assert!(!config.auto_generate_on_reload);
    }

    #[test]
    fn parses_partial_toml() {
        let config = SummariesConfig::from_toml_str(
            r#"
scan_directories = ["Scripts", "Assets/Editor"]
auto_generate_on_reload = true
tooltip_line_length = 3
"#,
        )
        .unwrap();
        assert_eq!(config.scan_root, PathBuf::from("Assets"));
        assert_eq!(config.scan_directories, vec!["Scripts", "Assets/Editor"]);
        assert!(config.auto_generate_on_reload);
        assert_eq!(config.tooltip_line_length, 3);
    }

    #[test]
    fn rejects_empty_scan_root() {
        let err = SummariesConfig::from_toml_str("scan_root = \"\"").unwrap_err();
        assert!(matches!(err, IndexerError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_unparsable_toml() {
        let err = SummariesConfig::from_toml_str("scan_directories = 3").unwrap_err();
        assert!(matches!(err, IndexerError::ConfigError(_)));
    }

    #[test]
    fn resolves_label_from_scan_root() {
        let temp = tempdir().unwrap();
        let config = SummariesConfig {
            scan_root: PathBuf::from("Content"),
            ..Default::default()
        };
        let paths = config.resolve(temp.path());
        assert_eq!(paths.root_label, "Content");
        assert_eq!(paths.scan_root, temp.path().join("Content"));
        assert_eq!(paths.output_dir, temp.path().join("Library/ScriptSummaries"));
    }

    #[test]
    fn scan_directories_accept_labelled_and_bare_entries() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("Assets/Scripts")).unwrap();
        fs::create_dir_all(temp.path().join("Assets/Editor")).unwrap();

        let paths = SummariesConfig::default().resolve(temp.path());
        let dirs = paths.scan_directories(&[
            "Scripts".to_string(),
            "Assets/Editor".to_string(),
            "Assets\\Scripts".to_string(),
            "Missing".to_string(),
            "  ".to_string(),
        ]);
        let whole_root = paths.scan_directories(&["Assets".to_string()]);
        assert_eq!(whole_root, vec![temp.path().join("Assets")]);

        assert_eq!(
            dirs,
            vec![
                temp.path().join("Assets/Scripts"),
                temp.path().join("Assets/Editor"),
            ]
        );
    }
}
