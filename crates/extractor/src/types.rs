use serde::{Deserialize, Serialize};

/// Owner assigned to sources that have no assembly definition above them
pub const FALLBACK_OWNER: &str = "Assembly-CSharp";

/// Separator between the owner name and the type key in a combined lookup key
pub const KEY_SEPARATOR: char = ';';

/// One documented class found in one source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MappingRecord {
    /// Summary text without comment markers, trimmed and never empty
    pub summary: String,

    /// Path rooted at the source folder label, e.g. `Assets/Scripts/Foo.cs`
    pub relative_path: String,

    /// Assembly the file belongs to, or [`FALLBACK_OWNER`]
    pub owner: String,

    /// Documentation ID of the class, `T:Namespace.Class` or `T:Class`
    pub type_key: String,
}

impl MappingRecord {
    #[must_use]
    pub fn new(
        summary: impl Into<String>,
        relative_path: impl Into<String>,
        owner: impl Into<String>,
        type_key: impl Into<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            relative_path: relative_path.into(),
            owner: owner.into(),
            type_key: type_key.into(),
        }
    }

    /// Key under which the index serves this record, `Owner;T:Namespace.Class`
    #[must_use]
    pub fn combined_key(&self) -> String {
        combined_key(&self.owner, &self.type_key)
    }
}

/// Build the `owner;typeKey` lookup key
#[must_use]
pub fn combined_key(owner: &str, type_key: &str) -> String {
    format!("{owner}{KEY_SEPARATOR}{type_key}")
}

/// Build a documentation ID for a class, with the namespace when one is present
#[must_use]
pub fn type_key(namespace: Option<&str>, class_name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("T:{ns}.{class_name}"),
        _ => format!("T:{class_name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_key_includes_namespace_when_present() {
        assert_eq!(type_key(Some("Game"), "Foo"), "T:Game.Foo");
        assert_eq!(type_key(Some(""), "Foo"), "T:Foo");
        assert_eq!(type_key(None, "Foo"), "T:Foo");
    }

    #[test]
    fn combined_key_joins_owner_and_type() {
        let record = MappingRecord::new("x", "Assets/Foo.cs", "Game.Core", "T:Game.Foo");
        assert_eq!(record.combined_key(), "Game.Core;T:Game.Foo");
    }
}
