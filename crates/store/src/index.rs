use crate::artifact::{list_artifacts, owner_from_path, DOC_EXTENSION, LOOKUP_EXTENSION};
use crate::loader::{load_documentation, load_lookups, LookupEntry};
use script_summaries_extractor::{combined_key, normalize_path, FALLBACK_OWNER};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Lifecycle of a [`SummaryIndex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    Uninitialized,
    Loading,
    Ready,
}

/// Declared type information of a runtime object
pub trait TypeMetadata {
    /// Fully-qualified type name, `Namespace.Class`
    fn full_type_name(&self) -> &str;

    /// Assembly the type was compiled into, if known
    fn owner_name(&self) -> Option<&str>;
}

/// Plain [`TypeMetadata`] value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    pub full_type_name: String,
    pub owner_name: Option<String>,
}

impl DeclaredType {
    pub fn new(full_type_name: impl Into<String>, owner_name: Option<String>) -> Self {
        Self {
            full_type_name: full_type_name.into(),
            owner_name,
        }
    }
}

impl TypeMetadata for DeclaredType {
    fn full_type_name(&self) -> &str {
        &self.full_type_name
    }

    fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }
}

/// What a collaborator asks a summary for
#[derive(Clone, Copy)]
pub enum SummaryQuery<'a> {
    /// Relative script path, e.g. `Assets/Scripts/Foo.cs`
    Path(&'a str),
    /// A live object's declared type
    Type(&'a dyn TypeMetadata),
}

/// Lookup key for a runtime type: `Owner;T:Namespace.Class`, with [`FALLBACK_OWNER`]
/// standing in for a missing owner.
pub fn key_for_type(metadata: &dyn TypeMetadata) -> String {
    let owner = metadata
        .owner_name()
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .unwrap_or(FALLBACK_OWNER);
    combined_key(owner, &format!("T:{}", metadata.full_type_name()))
}

/// Receives a signal whenever the artifact directory was rewritten
pub trait ArtifactListener: Send + Sync {
    fn artifacts_changed(&self, output_dir: &Path);
}

/// Both lookup maps, built together and published together
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SummarySnapshot {
    by_path: HashMap<String, String>,
    by_owner_type: HashMap<String, String>,
}

impl SummarySnapshot {
    /// Load every artifact in `dir`. A missing directory yields an empty snapshot; an
    /// unreadable artifact is logged and skipped.
    pub fn load(dir: &Path) -> Self {
        if !dir.is_dir() {
            log::debug!("No summaries generated yet at {}", dir.display());
            return Self::default();
        }

        let mut documentation: HashMap<String, HashMap<String, String>> = HashMap::new();
        for path in artifact_files(dir, DOC_EXTENSION) {
            let owner = match owner_from_path(&path) {
                Ok(owner) => owner,
                Err(e) => {
                    log::warn!("{e}");
                    continue;
                }
            };
            match load_documentation(&path) {
                Ok(summaries) => {
                    documentation.insert(owner, summaries);
                }
                Err(e) => log::warn!("Skipping documentation file {}: {e}", path.display()),
            }
        }

        let mut lookups = Vec::new();
        for path in artifact_files(dir, LOOKUP_EXTENSION) {
            match load_lookups(&path) {
                Ok(entries) => lookups.extend(entries),
                Err(e) => log::warn!("Skipping lookup file {}: {e}", path.display()),
            }
        }

        Self::from_parts(&documentation, lookups)
    }

    /// Join lookup entries against per-owner documentation.
    ///
    /// Entries whose owner or type key has no documentation are dropped. A path seen twice
    /// keeps the last summary.
    pub fn from_parts(
        documentation: &HashMap<String, HashMap<String, String>>,
        lookups: impl IntoIterator<Item = LookupEntry>,
    ) -> Self {
        let mut snapshot = Self::default();
        for entry in lookups {
            let Some(summary) = documentation
                .get(&entry.owner)
                .and_then(|summaries| summaries.get(&entry.type_key))
            else {
                log::debug!(
                    "Dropping lookup {} -> {}: no documentation",
                    entry.relative_path,
                    entry.combined_key()
                );
                continue;
            };

            snapshot
                .by_owner_type
                .insert(entry.combined_key(), summary.clone());
            snapshot.by_path.insert(entry.relative_path, summary.clone());
        }
        snapshot
    }

    pub fn get_by_path(&self, relative_path: &str) -> Option<&str> {
        self.by_path.get(relative_path).map(String::as_str)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&str> {
        self.by_owner_type.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// `(relative path, summary)` pairs sorted by path
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .by_path
            .iter()
            .map(|(path, summary)| (path.clone(), summary.clone()))
            .collect();
        entries.sort();
        entries
    }
}

fn artifact_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    list_artifacts(dir, extension).unwrap_or_else(|e| {
        log::warn!("Failed to list {extension} files in {}: {e}", dir.display());
        Vec::new()
    })
}

struct IndexState {
    phase: IndexPhase,
    snapshot: Option<Arc<SummarySnapshot>>,
}

/// In-memory summary lookups backed by one artifact directory.
///
/// Readers see either the previous snapshot or the new one, never a mix. Lookups made
/// before the first load completes return `None`.
pub struct SummaryIndex {
    output_dir: PathBuf,
    state: RwLock<IndexState>,
    writer: Mutex<()>,
}

impl SummaryIndex {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            state: RwLock::new(IndexState {
                phase: IndexPhase::Uninitialized,
                snapshot: None,
            }),
            writer: Mutex::new(()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn phase(&self) -> IndexPhase {
        self.state
            .read()
            .map_or(IndexPhase::Uninitialized, |state| state.phase)
    }

    /// Rebuild both maps from disk and publish them; returns the number of paths served
    pub fn reinitialize(&self) -> usize {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.set_phase(IndexPhase::Loading);

        let snapshot = Arc::new(SummarySnapshot::load(&self.output_dir));
        let count = snapshot.len();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.snapshot = Some(snapshot);
        state.phase = IndexPhase::Ready;
        drop(state);

        log::info!(
            "Loaded {count} script summaries from {}",
            self.output_dir.display()
        );
        count
    }

    fn set_phase(&self, phase: IndexPhase) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.phase = phase;
    }

    /// Current published snapshot, if any load has completed
    pub fn snapshot(&self) -> Option<Arc<SummarySnapshot>> {
        self.state.read().ok()?.snapshot.clone()
    }

    pub fn get_by_path(&self, relative_path: &str) -> Option<String> {
        let normalized = normalize_path(relative_path);
        self.snapshot()?.get_by_path(&normalized).map(str::to_string)
    }

    pub fn get_by_owner_and_type(&self, owner: &str, type_key: &str) -> Option<String> {
        self.get_by_key(&combined_key(owner, type_key))
    }

    /// Lookup by the combined `owner;typeKey` key
    pub fn get_by_key(&self, key: &str) -> Option<String> {
        self.snapshot()?.get_by_key(key).map(str::to_string)
    }

    pub fn get_for_type(&self, metadata: &dyn TypeMetadata) -> Option<String> {
        self.get_by_key(&key_for_type(metadata))
    }

    pub fn get_summary(&self, query: SummaryQuery<'_>) -> Option<String> {
        match query {
            SummaryQuery::Path(path) => self.get_by_path(path),
            SummaryQuery::Type(metadata) => self.get_for_type(metadata),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().map_or(0, |snapshot| snapshot.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.snapshot()
            .map(|snapshot| snapshot.entries())
            .unwrap_or_default()
    }
}

impl ArtifactListener for SummaryIndex {
    fn artifacts_changed(&self, output_dir: &Path) {
        log::debug!("Artifacts changed in {}, reloading", output_dir.display());
        self.reinitialize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{write_artifacts, ArtifactSet};
    use pretty_assertions::assert_eq;
    use script_summaries_extractor::MappingRecord;
    use std::fs;
    use tempfile::tempdir;

    fn docs(owner: &str, pairs: &[(&str, &str)]) -> (String, HashMap<String, String>) {
        (
            owner.to_string(),
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn entry(path: &str, owner: &str, type_key: &str) -> LookupEntry {
        LookupEntry {
            relative_path: path.to_string(),
            owner: owner.to_string(),
            type_key: type_key.to_string(),
        }
    }

    #[test]
    fn joins_lookups_with_documentation() {
        let documentation: HashMap<_, _> =
            [docs("Game", &[("T:Game.Foo", "Handles foo.")])].into_iter().collect();
        let snapshot = SummarySnapshot::from_parts(
            &documentation,
            vec![
                entry("Assets/Foo.cs", "Game", "T:Game.Foo"),
                entry("Assets/Missing.cs", "Game", "T:Game.Missing"),
                entry("Assets/Other.cs", "Other", "T:Game.Foo"),
            ],
        );

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get_by_path("Assets/Foo.cs"), Some("Handles foo."));
        assert_eq!(snapshot.get_by_key("Game;T:Game.Foo"), Some("Handles foo."));
        assert_eq!(snapshot.get_by_path("Assets/Missing.cs"), None);
        assert_eq!(snapshot.get_by_key("Game;T:Game.Missing"), None);
        assert_eq!(snapshot.get_by_path("Assets/Other.cs"), None);
        assert_eq!(snapshot.get_by_key("Other;T:Game.Foo"), None);
    }

    #[test]
    fn duplicate_path_last_wins() {
        let documentation: HashMap<_, _> = [
            docs("A", &[("T:X", "from A")]),
            docs("B", &[("T:X", "from B")]),
        ]
        .into_iter()
        .collect();
        let snapshot = SummarySnapshot::from_parts(
            &documentation,
            vec![
                entry("Assets/X.cs", "A", "T:X"),
                entry("Assets/X.cs", "B", "T:X"),
            ],
        );

        assert_eq!(snapshot.get_by_path("Assets/X.cs"), Some("from B"));
        assert_eq!(snapshot.get_by_key("A;T:X"), Some("from A"));
        assert_eq!(snapshot.get_by_key("B;T:X"), Some("from B"));
    }

    #[test]
    fn uninitialized_index_returns_nothing() {
        let temp = tempdir().unwrap();
        let index = SummaryIndex::new(temp.path());
        assert_eq!(index.phase(), IndexPhase::Uninitialized);
        assert_eq!(index.get_by_path("Assets/Foo.cs"), None);
        assert!(index.is_empty());
    }

    #[test]
    fn missing_output_dir_is_ready_and_empty() {
        let temp = tempdir().unwrap();
        let index = SummaryIndex::new(temp.path().join("never-generated"));
        assert_eq!(index.reinitialize(), 0);
        assert_eq!(index.phase(), IndexPhase::Ready);
        assert_eq!(index.get_by_path("Assets/Foo.cs"), None);
    }

    #[test]
    fn loads_written_artifacts() {
        let temp = tempdir().unwrap();
        let records = vec![MappingRecord::new(
            "Handles foo.",
            "Assets/Scripts/Foo.cs",
            FALLBACK_OWNER,
            "T:Game.Foo",
        )];
        write_artifacts(temp.path(), &ArtifactSet::encode(&records).unwrap()).unwrap();

        let index = SummaryIndex::new(temp.path());
        index.reinitialize();

        assert_eq!(
            index.get_by_path("Assets/Scripts/Foo.cs").as_deref(),
            Some("Handles foo.")
        );
        assert_eq!(
            index.get_by_path(r"Assets\Scripts\Foo.cs").as_deref(),
            Some("Handles foo.")
        );
        assert_eq!(
            index
                .get_by_owner_and_type(FALLBACK_OWNER, "T:Game.Foo")
                .as_deref(),
            Some("Handles foo.")
        );

        let object = DeclaredType::new("Game.Foo", None);
        assert_eq!(
            index.get_summary(SummaryQuery::Type(&object)).as_deref(),
            Some("Handles foo.")
        );
        assert_eq!(
            index.entries(),
            vec![("Assets/Scripts/Foo.cs".to_string(), "Handles foo.".to_string())]
        );
    }

    #[test]
    fn reinitialize_replaces_snapshot() {
        let temp = tempdir().unwrap();
        let first = vec![MappingRecord::new("Old.", "Assets/A.cs", "Game", "T:A")];
        write_artifacts(temp.path(), &ArtifactSet::encode(&first).unwrap()).unwrap();

        let index = SummaryIndex::new(temp.path());
        index.reinitialize();
        let before = index.snapshot().unwrap();

        fs::remove_file(temp.path().join("Game.doc")).unwrap();
        fs::remove_file(temp.path().join("Game.lookup")).unwrap();
        let second = vec![MappingRecord::new("New.", "Assets/B.cs", "Game", "T:B")];
        write_artifacts(temp.path(), &ArtifactSet::encode(&second).unwrap()).unwrap();
        index.artifacts_changed(temp.path());

        assert_eq!(before.get_by_path("Assets/A.cs"), Some("Old."));
        assert_eq!(index.get_by_path("Assets/A.cs"), None);
        assert_eq!(index.get_by_path("Assets/B.cs").as_deref(), Some("New."));
    }

    #[test]
    fn readers_never_mix_generations() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let temp = tempdir().unwrap();
        let generation = |summary: &str, path: &str, type_key: &str| {
            ArtifactSet::encode(&[
                MappingRecord::new(summary, "Assets/Shared.cs", "Game", "T:Shared"),
                MappingRecord::new(summary, path, "Game", type_key),
            ])
            .unwrap()
        };
        let gen_a = generation("a", "Assets/A.cs", "T:A");
        let gen_b = generation("b", "Assets/B.cs", "T:B");

        write_artifacts(temp.path(), &gen_a).unwrap();
        let index = SummaryIndex::new(temp.path());
        index.reinitialize();
        let done = AtomicBool::new(false);

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        assert!(index.get_by_path("Assets/Shared.cs").is_some());

                        let snapshot = index.snapshot().unwrap();
                        let by_path = snapshot.get_by_path("Assets/Shared.cs");
                        assert_eq!(by_path, snapshot.get_by_key("Game;T:Shared"));
                        match by_path {
                            Some("a") => {
                                assert_eq!(snapshot.get_by_key("Game;T:A"), Some("a"));
                                assert_eq!(snapshot.get_by_path("Assets/B.cs"), None);
                            }
                            Some("b") => {
                                assert_eq!(snapshot.get_by_key("Game;T:B"), Some("b"));
                                assert_eq!(snapshot.get_by_path("Assets/A.cs"), None);
                            }
                            other => panic!("unexpected generation {other:?}"),
                        }
                    }
                });
            }

            scope.spawn(|| {
                for round in 0..50 {
                    let next = if round % 2 == 0 { &gen_b } else { &gen_a };
                    write_artifacts(temp.path(), next).unwrap();
                    index.reinitialize();
                }
                done.store(true, Ordering::Release);
            });
        });
    }

    #[test]
    fn instances_are_independent() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let records = vec![MappingRecord::new("Only in a.", "Assets/A.cs", "Game", "T:A")];
        write_artifacts(a.path(), &ArtifactSet::encode(&records).unwrap()).unwrap();

        let index_a = SummaryIndex::new(a.path());
        let index_b = SummaryIndex::new(b.path());
        index_a.reinitialize();
        index_b.reinitialize();

        assert_eq!(index_a.get_by_path("Assets/A.cs").as_deref(), Some("Only in a."));
        assert_eq!(index_b.get_by_path("Assets/A.cs"), None);
    }

    #[test]
    fn key_for_type_uses_fallback_owner() {
        let with_owner = DeclaredType::new("Game.Foo", Some("Game.Runtime".to_string()));
        let blank_owner = DeclaredType::new("Foo", Some("  ".to_string()));
        assert_eq!(key_for_type(&with_owner), "Game.Runtime;T:Game.Foo");
        assert_eq!(key_for_type(&blank_owner), "Assembly-CSharp;T:Foo");
    }
}
