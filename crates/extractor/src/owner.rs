use crate::error::{ExtractorError, Result};
use crate::types::FALLBACK_OWNER;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of a compilation-unit (assembly) descriptor
pub const DESCRIPTOR_EXTENSION: &str = "asmdef";

/// The part of an assembly definition we read
#[derive(Debug, Deserialize)]
struct AssemblyDefinition {
    #[serde(default)]
    name: String,
}

/// Finds the assembly a source file belongs to by walking up to the closest descriptor
#[derive(Debug, Clone, Default)]
pub struct OwnerResolver {
    /// Last directory inspected; `None` walks to the filesystem root
    boundary: Option<PathBuf>,
}

impl OwnerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the upward walk after inspecting `boundary`
    pub fn with_boundary(boundary: impl Into<PathBuf>) -> Self {
        Self {
            boundary: Some(boundary.into()),
        }
    }

    /// Owner name for `file`: the closest descriptor wins, else [`FALLBACK_OWNER`].
    ///
    /// Unreadable or malformed descriptors are skipped and the walk continues upward.
    pub fn resolve(&self, file: &Path) -> String {
        let mut dir = file.parent();
        while let Some(current) = dir {
            match read_descriptor_in(current) {
                Ok(Some(name)) => return name,
                Ok(None) => {}
                Err(e) => log::warn!("Ignoring assembly definition in {}: {e}", current.display()),
            }

            if self.boundary.as_deref().is_some_and(|b| b == current) {
                break;
            }
            dir = current.parent();
        }
        FALLBACK_OWNER.to_string()
    }
}

/// Declared name of the descriptor in `dir`, if there is one.
///
/// When several descriptors sit in the same directory the lexicographically first is used.
fn read_descriptor_in(dir: &Path) -> Result<Option<String>> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Ok(None);
    };

    let mut descriptors: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_descriptor(path))
        .collect();
    descriptors.sort();

    let Some(path) = descriptors.into_iter().next() else {
        return Ok(None);
    };

    let content = fs::read_to_string(&path)?;
    let definition: AssemblyDefinition = serde_json::from_str(&content)
        .map_err(|source| ExtractorError::InvalidDescriptor {
            path: path.clone(),
            source,
        })?;
    let name = definition.name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    Ok(Some(name.to_string()))
}

fn is_descriptor(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DESCRIPTOR_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_asmdef(dir: &Path, file: &str, name: &str) {
        fs::write(dir.join(file), format!(r#"{{ "name": "{name}" }}"#)).unwrap();
    }

    #[test]
    fn closest_descriptor_wins() {
        let temp = tempdir().unwrap();
        let outer = temp.path().join("A");
        let inner = outer.join("B");
        fs::create_dir_all(&inner).unwrap();
        write_asmdef(&outer, "Outer.asmdef", "Outer");
        write_asmdef(&inner, "Inner.asmdef", "Inner");

        let resolver = OwnerResolver::with_boundary(temp.path());
        assert_eq!(resolver.resolve(&inner.join("File.cs")), "Inner");
    }

    #[test]
    fn falls_back_to_parent_descriptor() {
        let temp = tempdir().unwrap();
        let outer = temp.path().join("A");
        let inner = outer.join("B");
        fs::create_dir_all(&inner).unwrap();
        write_asmdef(&outer, "Outer.asmdef", "Outer");

        let resolver = OwnerResolver::with_boundary(temp.path());
        assert_eq!(resolver.resolve(&inner.join("File.cs")), "Outer");
    }

    #[test]
    fn no_descriptor_yields_fallback() {
        let temp = tempdir().unwrap();
        let inner = temp.path().join("A").join("B");
        fs::create_dir_all(&inner).unwrap();

        let resolver = OwnerResolver::with_boundary(temp.path());
        assert_eq!(resolver.resolve(&inner.join("File.cs")), FALLBACK_OWNER);
    }

    #[test]
    fn malformed_descriptor_is_skipped() {
        let temp = tempdir().unwrap();
        let outer = temp.path().join("A");
        let inner = outer.join("B");
        fs::create_dir_all(&inner).unwrap();
        write_asmdef(&outer, "Outer.asmdef", "Outer");
        fs::write(inner.join("Broken.asmdef"), "{ not json").unwrap();

        let resolver = OwnerResolver::with_boundary(temp.path());
        assert_eq!(resolver.resolve(&inner.join("File.cs")), "Outer");
    }

    #[test]
    fn walk_stops_at_boundary() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("Project");
        let scripts = project.join("Assets").join("Scripts");
        fs::create_dir_all(&scripts).unwrap();
        write_asmdef(temp.path(), "Above.asmdef", "Above");

        let resolver = OwnerResolver::with_boundary(&project);
        assert_eq!(resolver.resolve(&scripts.join("File.cs")), FALLBACK_OWNER);
    }
}
