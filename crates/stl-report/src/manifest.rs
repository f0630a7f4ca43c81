//! SHA-256 manifests and on-disk tree comparison.
//!
//! Manifest lines are `<sha256>  <relpath>\n`, sorted by relative path, with
//! `/` separators on every platform. A manifest never lists itself.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use stl_core::content_id;

use crate::error::{ReportError, Result};
use crate::tables::Artifact;

pub const MANIFEST: &str = "MANIFEST.sha256";

/// One file of an on-disk tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub rel_path: String,
    pub size: u64,
    pub sha256: String,
}

fn render<'a>(entries: impl Iterator<Item = (&'a str, String)>) -> String {
    let sorted: BTreeMap<&str, String> = entries.collect();
    sorted
        .into_iter()
        .map(|(path, sha)| format!("{sha}  {path}\n"))
        .collect()
}

/// Manifest text for an in-memory artifact set.
pub fn manifest_text(artifacts: &[Artifact]) -> String {
    render(
        artifacts
            .iter()
            .filter(|a| a.rel_path != MANIFEST)
            .map(|a| (a.rel_path.as_str(), a.sha256())),
    )
}

/// Write a fully rendered artifact set plus its manifest into `dir`.
///
/// Paths are checked and the manifest is rendered before the first byte is
/// written.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<PathBuf> {
    let mut seen = BTreeSet::new();
    for a in artifacts {
        if a.rel_path.is_empty() || a.rel_path.starts_with('/') || a.rel_path.contains("..") {
            return Err(ReportError::Input(format!("bad artifact path '{}'", a.rel_path)));
        }
        if !seen.insert(a.rel_path.as_str()) {
            return Err(ReportError::Input(format!("duplicate artifact '{}'", a.rel_path)));
        }
    }
    let manifest = manifest_text(artifacts);

    fs::create_dir_all(dir)?;
    for a in artifacts {
        let path = dir.join(&a.rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &a.bytes)?;
        tracing::info!("wrote {}", path.display());
    }
    let manifest_path = dir.join(MANIFEST);
    fs::write(&manifest_path, manifest)?;
    tracing::info!("wrote {}", manifest_path.display());
    Ok(manifest_path)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<TreeEntry>) -> Result<()> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    children.sort();

    for path in children {
        if path.is_dir() {
            walk(root, &path, out)?;
            continue;
        }
        let rel = path.strip_prefix(root).map_err(|_| {
            ReportError::Input(format!("{} escapes {}", path.display(), root.display()))
        })?;
        let rel_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = fs::read(&path)?;
        out.push(TreeEntry {
            rel_path,
            size: bytes.len() as u64,
            sha256: content_id(&bytes),
        });
    }
    Ok(())
}

/// Every file under `root`, recursively, sorted by relative path. The
/// top-level manifest is skipped; nested manifests are listed.
pub fn tree_entries(root: &Path) -> Result<Vec<TreeEntry>> {
    let mut out = Vec::new();
    walk(root, root, &mut out)?;
    out.retain(|e| e.rel_path != MANIFEST);
    out.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(out)
}

/// Write `MANIFEST.sha256` covering everything currently under `root`.
pub fn write_tree_manifest(root: &Path) -> Result<PathBuf> {
    let entries = tree_entries(root)?;
    let text = render(entries.iter().map(|e| (e.rel_path.as_str(), e.sha256.clone())));
    let path = root.join(MANIFEST);
    fs::write(&path, text)?;
    tracing::info!("wrote {} ({} entries)", path.display(), entries.len());
    Ok(path)
}

/// File-by-file differences between two trees (relative path, size,
/// SHA-256). Empty when the trees are identical.
pub fn compare_trees(a: &Path, b: &Path) -> Result<Vec<String>> {
    let left: BTreeMap<String, TreeEntry> = tree_entries(a)?
        .into_iter()
        .map(|e| (e.rel_path.clone(), e))
        .collect();
    let right: BTreeMap<String, TreeEntry> = tree_entries(b)?
        .into_iter()
        .map(|e| (e.rel_path.clone(), e))
        .collect();

    let mut diffs = Vec::new();
    for (path, l) in &left {
        match right.get(path) {
            None => diffs.push(format!("only in {}: {path}", a.display())),
            Some(r) if l.size != r.size => {
                diffs.push(format!("size differs: {path} ({} vs {})", l.size, r.size))
            }
            Some(r) if l.sha256 != r.sha256 => diffs.push(format!("sha256 differs: {path}")),
            Some(_) => {}
        }
    }
    for path in right.keys().filter(|p| !left.contains_key(*p)) {
        diffs.push(format!("only in {}: {path}", b.display()));
    }
    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_sorted_and_excludes_itself() {
        let arts = vec![
            Artifact::new("b.txt", "b"),
            Artifact::new("a.txt", "a"),
            Artifact::new(MANIFEST, "stale"),
        ];
        let text = manifest_text(&arts);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("  a.txt"));
        assert!(lines[1].ends_with("  b.txt"));
        assert_eq!(&lines[0][..64], content_id(b"a"));
    }

    #[test]
    fn test_write_artifacts_rejects_bad_paths() {
        let dir = TempDir::new().unwrap();
        let dup = vec![Artifact::new("x", "1"), Artifact::new("x", "2")];
        assert!(write_artifacts(dir.path(), &dup).is_err());
        assert!(!dir.path().join("x").exists());

        let escape = vec![Artifact::new("../x", "1")];
        assert!(write_artifacts(dir.path(), &escape).is_err());
    }

    #[test]
    fn test_tree_manifest_matches_artifact_manifest() {
        let dir = TempDir::new().unwrap();
        let arts = vec![Artifact::new("one.csv", "t,d\n"), Artifact::new("sub/two.txt", "x")];
        let path = write_artifacts(dir.path(), &arts).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, manifest_text(&arts));

        write_tree_manifest(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
    }

    #[test]
    fn test_compare_trees() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let arts = vec![Artifact::new("k/v.csv", "1,2\n")];
        write_artifacts(a.path(), &arts).unwrap();
        write_artifacts(b.path(), &arts).unwrap();
        assert!(compare_trees(a.path(), b.path()).unwrap().is_empty());

        fs::write(b.path().join("k/v.csv"), "1,3\n").unwrap();
        fs::write(b.path().join("extra"), "").unwrap();
        let diffs = compare_trees(a.path(), b.path()).unwrap();
        assert_eq!(diffs.len(), 2);
        assert!(diffs[0].starts_with("sha256 differs: k/v.csv"));
        assert!(diffs[1].contains("extra"));
    }
}
