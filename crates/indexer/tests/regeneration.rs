use pretty_assertions::assert_eq;
use script_summaries_indexer::{Regenerator, SummariesConfig, SummariesService};
use script_summaries_store::{DeclaredType, SummaryIndex, SummaryQuery};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Assets")).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    fn output(&self) -> PathBuf {
        self.root().join("Library/ScriptSummaries")
    }

    fn artifacts(&self) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = fs::read_dir(self.output())
            .unwrap()
            .map(|entry| {
                let path = entry.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                (name, fs::read_to_string(&path).unwrap())
            })
            .collect();
        files.sort();
        files
    }
}

fn config(directories: &[&str]) -> SummariesConfig {
    SummariesConfig {
        scan_directories: directories.iter().map(|d| d.to_string()).collect(),
        ..Default::default()
    }
}

const FOO: &str = r#"namespace Game
{
    /// <summary>Handles foo.</summary>
    public class Foo {}
}
"#;

#[test]
fn generates_and_serves_documented_class() {
    let project = Project::new();
    project.write("Assets/Scripts/Foo.cs", FOO);

    let service = SummariesService::new(config(&["Scripts"]), project.root());
    let stats = service.regenerate_and_reload();

    assert!(stats.is_clean(), "{stats:?}");
    assert_eq!(stats.records, 1);
    assert_eq!(
        service
            .get_summary(SummaryQuery::Path("Assets/Scripts/Foo.cs"))
            .as_deref(),
        Some("Handles foo.")
    );
    assert_eq!(
        service
            .index()
            .get_by_owner_and_type("Assembly-CSharp", "T:Game.Foo")
            .as_deref(),
        Some("Handles foo.")
    );

    let lookup = fs::read_to_string(project.output().join("Assembly-CSharp.lookup")).unwrap();
    assert_eq!(lookup, "Assets/Scripts/Foo.cs=Assembly-CSharp;T:Game.Foo\n");
}

#[test]
fn assembly_descriptors_split_owners() {
    let project = Project::new();
    project
        .write("Assets/Scripts/Foo.cs", FOO)
        .write("Assets/Scripts/Runtime/Game.Runtime.asmdef", r#"{ "name": "Game.Runtime" }"#)
        .write(
            "Assets/Scripts/Runtime/Player.cs",
            "/// <summary>The player.</summary>\npublic class Player {}\n",
        );

    let service = SummariesService::new(config(&["Assets/Scripts"]), project.root());
    let stats = service.regenerate_and_reload();
    assert_eq!(stats.owners, 2);

    let player = DeclaredType::new("Player", Some("Game.Runtime".to_string()));
    assert_eq!(
        service.get_summary(SummaryQuery::Type(&player)).as_deref(),
        Some("The player.")
    );
    let foo = DeclaredType::new("Game.Foo", None);
    assert_eq!(
        service.get_summary(SummaryQuery::Type(&foo)).as_deref(),
        Some("Handles foo.")
    );

    let names: Vec<String> = project.artifacts().into_iter().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        vec![
            "Assembly-CSharp.doc",
            "Assembly-CSharp.lookup",
            "Game.Runtime.doc",
            "Game.Runtime.lookup",
        ]
    );
}

#[test]
fn empty_configuration_produces_nothing() {
    let project = Project::new();
    project.write("Assets/Scripts/Foo.cs", FOO);

    let service = SummariesService::new(config(&[]), project.root());
    let stats = service.regenerate_and_reload();

    assert!(stats.aborted);
    assert_eq!(stats.records, 0);
    assert_eq!(
        service.get_summary(SummaryQuery::Path("Assets/Scripts/Foo.cs")),
        None
    );
    assert!(!project.output().exists() || project.artifacts().is_empty());
}

#[test]
fn no_documented_classes_is_not_an_error() {
    let project = Project::new();
    project.write("Assets/Scripts/Plain.cs", "public class Plain {}\n");

    let stats = Regenerator::new(config(&["Scripts"]), project.root()).regenerate();
    assert!(!stats.aborted);
    assert_eq!(stats.records, 0);
    assert!(project.artifacts().is_empty());
}

#[test]
fn regeneration_is_idempotent() {
    let project = Project::new();
    project
        .write("Assets/Scripts/Foo.cs", FOO)
        .write(
            "Assets/Scripts/Bar.cs",
            "/// <summary>Bar &amp; \"quoted\" <b>text</b>.</summary>\nclass Bar {}\n",
        );

    let regenerator = Regenerator::new(config(&["Scripts"]), project.root());
    regenerator.regenerate();
    let first = project.artifacts();
    regenerator.regenerate();
    assert_eq!(project.artifacts(), first);
}

#[test]
fn stale_artifacts_are_removed() {
    let project = Project::new();
    project.write("Assets/Scripts/Runtime/Game.Runtime.asmdef", r#"{ "name": "Game.Runtime" }"#);
    project.write(
        "Assets/Scripts/Runtime/Player.cs",
        "/// <summary>The player.</summary>\npublic class Player {}\n",
    );

    let index = Arc::new(SummaryIndex::new(project.output()));
    let mut regenerator = Regenerator::new(config(&["Scripts"]), project.root());
    regenerator.subscribe(index.clone());
    regenerator.regenerate();
    assert_eq!(index.len(), 1);

    fs::remove_file(project.root().join("Assets/Scripts/Runtime/Player.cs")).unwrap();
    regenerator.regenerate();

    assert!(project.artifacts().is_empty());
    assert_eq!(index.get_by_path("Assets/Scripts/Runtime/Player.cs"), None);
}

#[test]
fn scan_filter_ignores_sibling_prefixes() {
    let project = Project::new();
    project
        .write("Assets/Scripts/Foo.cs", FOO)
        .write(
            "Assets/ScriptsOld/Old.cs",
            "/// <summary>Old.</summary>\nclass Old {}\n",
        );

    let service = SummariesService::new(config(&["Scripts"]), project.root());
    let stats = service.regenerate_and_reload();

    assert_eq!(stats.records, 1);
    assert_eq!(
        service.get_summary(SummaryQuery::Path("Assets/ScriptsOld/Old.cs")),
        None
    );
}

#[test]
fn missing_scan_directory_aborts() {
    let project = Project::new();
    project.write("Assets/Scripts/Foo.cs", FOO);

    let stats = Regenerator::new(config(&["Gone"]), project.root()).regenerate();
    assert!(stats.aborted);
}

#[test]
fn several_scan_directories_are_merged() {
    let project = Project::new();
    project
        .write("Assets/Scripts/Foo.cs", FOO)
        .write(
            "Assets/Editor/Tool.cs",
            "/// <summary>Editor tool.</summary>\nclass Tool {}\n",
        )
        .write(
            "Assets/Other/Other.cs",
            "/// <summary>Other.</summary>\nclass Other {}\n",
        );

    let service = SummariesService::new(config(&["Scripts", "Editor"]), project.root());
    let stats = service.regenerate_and_reload();

    assert_eq!(stats.files_scanned, 2);
    assert_eq!(
        service.index().entries(),
        vec![
            ("Assets/Editor/Tool.cs".to_string(), "Editor tool.".to_string()),
            ("Assets/Scripts/Foo.cs".to_string(), "Handles foo.".to_string()),
        ]
    );
}
