use crate::error::{Result, StoreError};
use script_summaries_extractor::MappingRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DOCUMENTATION_SCHEMA_VERSION: u32 = 1;

/// Extension of the per-owner documentation file (`<owner>.doc`)
pub const DOC_EXTENSION: &str = "doc";

/// Extension of the per-owner lookup file (`<owner>.lookup`)
pub const LOOKUP_EXTENSION: &str = "lookup";

/// Suffix of a file being written, renamed away once complete
const TEMP_EXTENSION: &str = "tmp";

/// On-disk shape of a documentation file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentationFile {
    pub schema_version: u32,
    pub members: Vec<DocMember>,
}

/// One `typeKey → summary` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocMember {
    /// Documentation ID, `T:Namespace.Class`
    pub name: String,
    pub summary: String,
}

/// File contents for every owner produced by one regeneration pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    /// owner → documentation file content
    pub documentation: BTreeMap<String, String>,
    /// owner → lookup file content
    pub lookups: BTreeMap<String, String>,
}

impl ArtifactSet {
    /// Group `records` by owner and render both artifacts for each.
    ///
    /// Records keep their input order inside an owner, in both files.
    pub fn encode(records: &[MappingRecord]) -> Result<Self> {
        Ok(Self {
            documentation: encode_documentation(records)?,
            lookups: encode_lookups(records),
        })
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.documentation.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.documentation.is_empty()
    }
}

fn group_by_owner(records: &[MappingRecord]) -> BTreeMap<&str, Vec<&MappingRecord>> {
    let mut groups: BTreeMap<&str, Vec<&MappingRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.owner.as_str()).or_default().push(record);
    }
    groups
}

/// owner → documentation file content
pub fn encode_documentation(records: &[MappingRecord]) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for (owner, group) in group_by_owner(records) {
        let file = DocumentationFile {
            schema_version: DOCUMENTATION_SCHEMA_VERSION,
            members: group
                .into_iter()
                .map(|record| DocMember {
                    name: record.type_key.clone(),
                    summary: record.summary.clone(),
                })
                .collect(),
        };
        let mut content = serde_json::to_string_pretty(&file)?;
        content.push('\n');
        out.insert(owner.to_string(), content);
    }
    Ok(out)
}

/// owner → lookup file content, one `relativePath=owner;typeKey` line per record
pub fn encode_lookups(records: &[MappingRecord]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (owner, group) in group_by_owner(records) {
        let mut content = String::new();
        for record in group {
            content.push_str(&record.relative_path);
            content.push('=');
            content.push_str(&record.combined_key());
            content.push('\n');
        }
        out.insert(owner.to_string(), content);
    }
    out
}

pub fn doc_file_name(owner: &str) -> String {
    format!("{owner}.{DOC_EXTENSION}")
}

pub fn lookup_file_name(owner: &str) -> String {
    format!("{owner}.{LOOKUP_EXTENSION}")
}

/// Owner name encoded in an artifact's file stem
pub fn owner_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::UnnamedArtifact(path.to_path_buf()))
}

/// Artifact files with `extension` in `dir`, sorted by path. A missing directory is empty.
pub fn list_artifacts(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == extension);
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Write every owner's two artifacts into `dir`, returning the owners that failed.
///
/// Each file is written to a temporary sibling first and renamed into place.
pub fn write_artifacts(dir: &Path, artifacts: &ArtifactSet) -> Result<Vec<String>> {
    fs::create_dir_all(dir)?;

    let mut failed = Vec::new();
    for owner in artifacts.owners() {
        let doc = artifacts.documentation.get(owner);
        let lookup = artifacts.lookups.get(owner);
        let (Some(doc), Some(lookup)) = (doc, lookup) else {
            log::warn!("Artifacts for {owner} are incomplete, skipping");
            failed.push(owner.to_string());
            continue;
        };

        let doc_path = dir.join(doc_file_name(owner));
        let result = write_file(&doc_path, doc).and_then(|()| {
            write_file(&dir.join(lookup_file_name(owner)), lookup).inspect_err(|_| {
                // A documentation file without its lookup would never be joined
                let _ = fs::remove_file(&doc_path);
            })
        });
        if let Err(e) = result {
            log::error!("Failed to write artifacts for {owner}: {e}");
            failed.push(owner.to_string());
        }
    }
    Ok(failed)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let tmp = temp_path(path);
    let result = fs::write(&tmp, content).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    Ok(result?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".");
    tmp.push(TEMP_EXTENSION);
    PathBuf::from(tmp)
}

/// Delete every documentation and lookup file in `dir`, along with temporaries an
/// interrupted write left behind; returns how many files were removed
pub fn clear_artifacts(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for extension in [DOC_EXTENSION, LOOKUP_EXTENSION] {
        for path in list_artifacts(dir, extension)? {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    for path in list_artifacts(dir, TEMP_EXTENSION)? {
        let is_artifact_temp = path
            .file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == DOC_EXTENSION || ext == LOOKUP_EXTENSION);
        if is_artifact_temp {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
