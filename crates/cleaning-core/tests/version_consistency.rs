//! Keeps member manifests in lockstep with the workspace version.

use std::path::{Path, PathBuf};

const MEMBERS: [&str; 3] = [
    "crates/artifact-ledger",
    "crates/cleaning-core",
    "crates/cleaning-cli",
];

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .unwrap()
        .to_path_buf()
}

fn manifest(path: &Path) -> toml::Value {
    let text = std::fs::read_to_string(path.join("Cargo.toml")).unwrap();
    text.parse().unwrap()
}

fn workspace_version() -> String {
    manifest(&workspace_root())["workspace"]["package"]["version"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test]
fn members_inherit_workspace_version() {
    let root = workspace_root();
    for member in MEMBERS {
        let doc = manifest(&root.join(member));
        let inherited = doc["package"]
            .get("version")
            .and_then(|v| v.get("workspace"))
            .and_then(toml::Value::as_bool);
        assert_eq!(
            inherited,
            Some(true),
            "{member} should use version.workspace = true"
        );
    }
}

#[test]
fn workspace_members_are_listed() {
    let doc = manifest(&workspace_root());
    let listed: Vec<&str> = doc["workspace"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(toml::Value::as_str)
        .collect();
    assert_eq!(listed, MEMBERS);
}

#[test]
fn internal_dependency_versions_match() {
    let version = workspace_version();
    let doc = manifest(&workspace_root());
    for name in ["artifact-ledger", "cleaning-core"] {
        let pinned = doc["workspace"]["dependencies"][name]["version"]
            .as_str()
            .unwrap();
        assert_eq!(pinned, version, "{name} dependency version drifted");
    }
}

#[test]
fn crate_version_constant_matches_workspace() {
    assert_eq!(cleaning_core::VERSION, workspace_version());
}
