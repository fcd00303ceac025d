use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobSet;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Find suite files under `path`.
///
/// Behavior:
/// - A file is returned as-is, whatever its name.
/// - A directory is walked; files whose path relative to it matches `include`
///   and does not match `exclude` are returned in sorted order.
pub fn discover_suites(
    path: &Utf8Path,
    include: &GlobSet,
    exclude: &GlobSet,
) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let meta = std::fs::metadata(path).with_context(|| format!("no such suite path: {path}"))?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut out: Vec<Utf8PathBuf> = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {path}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(abs) = pathbuf_to_utf8(entry.path().to_path_buf()) else {
            continue;
        };
        let rel = abs
            .strip_prefix(path)
            .unwrap_or(&abs)
            .as_str()
            .replace('\\', "/");

        if include.is_match(&rel) && !exclude.is_match(&rel) {
            out.push(abs);
        }
    }

    // Stable order.
    out.sort();
    out.dedup();

    Ok(out)
}

fn pathbuf_to_utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use globset::{Glob, GlobSetBuilder};
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    fn globs(patterns: &[&str]) -> GlobSet {
        let mut b = GlobSetBuilder::new();
        for p in patterns {
            b.add(Glob::new(p).expect("glob"));
        }
        b.build().expect("globset")
    }

    #[test]
    fn discover_walks_directories_in_sorted_order() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("z/suite.yaml"), "tests: []\n");
        write_file(&root.join("a/suite.yaml"), "tests: []\n");
        write_file(&root.join("a/pods.suite.yaml"), "tests: []\n");
        write_file(&root.join("a/template.yaml"), "kind: K\n");
        write_file(&root.join("vendor/suite.yaml"), "tests: []\n");

        let found = discover_suites(
            &root,
            &globs(&["**/suite.yaml", "**/*.suite.yaml"]),
            &globs(&["vendor/**"]),
        )
        .expect("discover");
        let rel: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(&root).expect("under root").as_str().to_string())
            .collect();
        assert_eq!(rel, vec!["a/pods.suite.yaml", "a/suite.yaml", "z/suite.yaml"]);
    }

    #[test]
    fn explicit_file_is_returned_regardless_of_patterns() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let file = root.join("custom-name.yaml");
        write_file(&file, "tests: []\n");

        let found = discover_suites(&file, &globs(&["**/suite.yaml"]), &globs(&[])).expect("discover");
        assert_eq!(found, vec![file]);
    }

    #[test]
    fn missing_path_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let err = discover_suites(&root.join("nope"), &globs(&[]), &globs(&[])).unwrap_err();
        assert!(err.to_string().contains("no such suite path"));
    }

    #[test]
    fn pathbuf_to_utf8_rejects_invalid() {
        #[cfg(unix)]
        {
            use std::ffi::OsString;
            use std::os::unix::ffi::OsStringExt;
            let invalid = OsString::from_vec(vec![0xFF, 0xFE, 0xFD]);
            let path = PathBuf::from(invalid);
            assert!(pathbuf_to_utf8(path).is_none());
        }
    }
}
