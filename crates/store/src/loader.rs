use crate::artifact::{DocumentationFile, DOCUMENTATION_SCHEMA_VERSION};
use crate::error::{Result, StoreError};
use script_summaries_extractor::{combined_key, KEY_SEPARATOR};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// One line of a lookup file: `relativePath=owner;typeKey`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupEntry {
    pub relative_path: String,
    pub owner: String,
    pub type_key: String,
}

impl LookupEntry {
    /// The `owner;typeKey` right-hand side of the line
    pub fn combined_key(&self) -> String {
        combined_key(&self.owner, &self.type_key)
    }
}

/// Why a lookup line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupLineError {
    MissingEquals,
    ExtraEquals,
    MissingSeparator,
    ExtraSeparator,
    EmptyField,
}

impl fmt::Display for LookupLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MissingEquals => "missing '='",
            Self::ExtraEquals => "more than one '='",
            Self::MissingSeparator => "missing ';' after '='",
            Self::ExtraSeparator => "more than one ';' after '='",
            Self::EmptyField => "empty path, owner or type key",
        };
        f.write_str(msg)
    }
}

/// Parse a documentation file body into `typeKey → summary`.
///
/// A type key listed twice keeps its last summary.
pub fn parse_documentation(content: &str) -> Result<HashMap<String, String>> {
    let file: DocumentationFile = serde_json::from_str(content)?;
    if file.schema_version != DOCUMENTATION_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema {
            found: file.schema_version,
            expected: DOCUMENTATION_SCHEMA_VERSION,
        });
    }

    Ok(file
        .members
        .into_iter()
        .map(|member| (member.name, member.summary))
        .collect())
}

pub fn load_documentation(path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)?;
    parse_documentation(&content)
}

/// Parse one non-blank lookup line; fields are trimmed
pub fn parse_lookup_line(line: &str) -> std::result::Result<LookupEntry, LookupLineError> {
    let (path, key) = line.split_once('=').ok_or(LookupLineError::MissingEquals)?;
    if key.contains('=') {
        return Err(LookupLineError::ExtraEquals);
    }
    let (owner, type_key) = key
        .split_once(KEY_SEPARATOR)
        .ok_or(LookupLineError::MissingSeparator)?;
    if type_key.contains(KEY_SEPARATOR) {
        return Err(LookupLineError::ExtraSeparator);
    }

    let (path, owner, type_key) = (path.trim(), owner.trim(), type_key.trim());
    if path.is_empty() || owner.is_empty() || type_key.is_empty() {
        return Err(LookupLineError::EmptyField);
    }

    Ok(LookupEntry {
        relative_path: path.to_string(),
        owner: owner.to_string(),
        type_key: type_key.to_string(),
    })
}

/// Parse a lookup file body. Blank lines are ignored; malformed lines are skipped with a
/// warning that names `source` and the line number.
pub fn parse_lookups(content: &str, source: &str) -> Vec<LookupEntry> {
    let mut entries = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_lookup_line(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::warn!("Skipping malformed lookup line {source}:{}: {e}", idx + 1),
        }
    }
    entries
}

pub fn load_lookups(path: impl AsRef<Path>) -> Result<Vec<LookupEntry>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    Ok(parse_lookups(&content, &path.display().to_string()))
}
