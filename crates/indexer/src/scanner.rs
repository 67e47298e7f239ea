use ignore::WalkBuilder;
use script_summaries_extractor::normalize_path;
use std::path::{Path, PathBuf};

const SOURCE_EXTENSION: &str = "cs";
const MAX_FILE_SIZE_BYTES: u64 = 4 * 1_048_576; // 4 MB

/// Walk behavior for [`FileScanner`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Apply `.gitignore`, global git excludes and `.git/info/exclude`
    pub respect_gitignore: bool,
}

/// Finds C# source files under a scan root
pub struct FileScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options: ScanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every source file under the root, sorted by normalized path
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let gitignore = self.options.respect_gitignore;
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .ignore(false)
            .parents(gitignore)
            .git_ignore(gitignore)
            .git_global(gitignore)
            .git_exclude(gitignore)
            .require_git(false);

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !is_source_file(path) {
                        continue;
                    }

                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                MAX_FILE_SIZE_BYTES
                            );
                            continue;
                        }
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort_by_cached_key(|path| normalize_path(&path.to_string_lossy()));
        log::info!("Found {} source files under {}", files.len(), self.root.display());
        files
    }

    /// Source files located inside at least one of `directories`.
    ///
    /// Containment is decided on normalized paths, case-insensitively, and only at path
    /// component boundaries (`Scripts` does not include `ScriptsOld`).
    pub fn scan_filtered(&self, directories: &[PathBuf]) -> Vec<PathBuf> {
        let prefixes: Vec<String> = directories.iter().map(|dir| dir_prefix(dir)).collect();
        let files: Vec<PathBuf> = self
            .scan()
            .into_iter()
            .filter(|path| is_included(path, &prefixes))
            .collect();

        log::info!(
            "{} source files inside {} scan directories",
            files.len(),
            directories.len()
        );
        files
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

/// Lowercased normalized directory path with exactly one trailing `/`
fn dir_prefix(dir: &Path) -> String {
    let mut prefix = normalize_path(&dir.to_string_lossy()).to_ascii_lowercase();
    while prefix.ends_with('/') && prefix.len() > 1 {
        prefix.pop();
    }
    prefix.push('/');
    prefix
}

fn is_included(path: &Path, prefixes: &[String]) -> bool {
    let normalized = normalize_path(&path.to_string_lossy()).to_ascii_lowercase();
    prefixes.iter().any(|prefix| {
        normalized.starts_with(prefix.as_str()) || normalized == prefix[..prefix.len() - 1]
    })
}
