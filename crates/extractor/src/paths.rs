use std::path::{Component, Path};

/// Convert a path into forward slash syntax
pub fn normalize_path(raw: &str) -> String {
    raw.replace('\\', "/")
}

/// Path of `path` below `root`, rooted at `label` (`Assets/Scripts/Foo.cs`).
///
/// Returns `None` when `path` does not live under `root`.
pub fn rooted_relative_path(root: &Path, label: &str, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut out = normalize_path(label.trim_end_matches(['/', '\\']));
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(&name.to_string_lossy());
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

/// Label for a source root: its final directory name
pub fn root_label(root: &Path) -> Option<String> {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
