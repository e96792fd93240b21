use ignore::WalkBuilder;
use std::cell::OnceCell;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{ListError, Result};

/// A JAR file selected for scanning, as named on the command line or found
/// in a directory or on the search path.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    path: PathBuf,
    real_path: OnceCell<PathBuf>,
}

impl ArchiveFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            real_path: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Canonical absolute path, resolved on first use.
    pub fn real_path(&self) -> Result<&Path> {
        if let Some(p) = self.real_path.get() {
            return Ok(p);
        }
        let resolved = self
            .path
            .canonicalize()
            .map_err(|source| ListError::ResolvePath {
                path: self.path.clone(),
                source,
            })?;
        Ok(self.real_path.get_or_init(|| resolved))
    }
}

pub fn is_jar_name(name: &OsStr) -> bool {
    name.to_string_lossy().to_ascii_lowercase().ends_with(".jar")
}

/// Explicit paths first, in order, then the search-path segments when one is
/// given. Archives named twice are scanned twice.
pub fn resolve_archives(
    explicit_paths: &[PathBuf],
    search_path: Option<&OsStr>,
) -> Result<Vec<ArchiveFile>> {
    let mut archives = Vec::new();

    for path in explicit_paths {
        add_jar_files(path, &mut archives)?;
    }

    if let Some(search_path) = search_path {
        let before = archives.len();
        let segments = split_search_path(search_path);
        tracing::debug!(segments = segments.len(), "searching class path");
        for segment in segments {
            add_jar_files(&segment, &mut archives)?;
        }
        tracing::debug!("{} JAR files found in class path", archives.len() - before);
    }

    Ok(archives)
}

pub fn split_search_path(search_path: &OsStr) -> Vec<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

fn add_jar_files(file_or_dir: &Path, archives: &mut Vec<ArchiveFile>) -> Result<()> {
    if !file_or_dir.exists() {
        return Err(ListError::NotFound {
            path: file_or_dir.to_path_buf(),
        });
    }

    if file_or_dir.is_file() {
        let is_jar = file_or_dir.file_name().is_some_and(is_jar_name);
        if is_jar {
            tracing::debug!("Found JAR file {}", file_or_dir.display());
            archives.push(ArchiveFile::new(file_or_dir));
        } else {
            tracing::debug!("Skipping non-JAR file {}", file_or_dir.display());
        }
        return Ok(());
    }

    for jar in list_jar_files(file_or_dir)? {
        tracing::debug!("Found JAR file {}", jar.display());
        archives.push(ArchiveFile::new(jar));
    }
    Ok(())
}

/// Direct children of `dir` that are JAR files, sorted by file name.
pub fn list_jar_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut jars = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| ListError::UnreadableDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.depth() == 0 {
            continue;
        }
        let path = entry.path();
        if path.is_file() && path.file_name().is_some_and(is_jar_name) {
            jars.push(path.to_path_buf());
        }
    }
    Ok(jars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&p).unwrap();
        p
    }

    fn names(archives: &[ArchiveFile]) -> Vec<String> {
        archives
            .iter()
            .map(|a| a.path().file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn directory_lists_only_direct_jar_files() {
        let base = temp_dir("class-lister-scan-dir");
        fs::write(base.join("b.jar"), b"x").unwrap();
        fs::write(base.join("A.JAR"), b"x").unwrap();
        fs::write(base.join("readme.txt"), b"x").unwrap();
        fs::create_dir_all(base.join("nested")).unwrap();
        fs::write(base.join("nested/c.jar"), b"x").unwrap();
        fs::create_dir_all(base.join("dir.jar")).unwrap();

        let archives = resolve_archives(std::slice::from_ref(&base), None).unwrap();
        assert_eq!(names(&archives), vec!["A.JAR", "b.jar"]);

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn explicit_files_keep_order_and_duplicates() {
        let base = temp_dir("class-lister-scan-files");
        let a = base.join("a.jar");
        let b = base.join("b.jar");
        let txt = base.join("notes.txt");
        fs::write(&a, b"x").unwrap();
        fs::write(&b, b"x").unwrap();
        fs::write(&txt, b"x").unwrap();

        let archives = resolve_archives(&[b.clone(), txt, a.clone(), b.clone()], None).unwrap();
        assert_eq!(names(&archives), vec!["b.jar", "a.jar", "b.jar"]);

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn missing_path_is_not_found() {
        let base = temp_dir("class-lister-scan-missing");
        let missing = base.join("missing.jar");

        let err = resolve_archives(std::slice::from_ref(&missing), None).unwrap_err();
        assert!(matches!(err, ListError::NotFound { path } if path == missing));

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn search_path_entries_follow_explicit_paths() {
        let base = temp_dir("class-lister-scan-classpath");
        let explicit = base.join("explicit.jar");
        let lib = base.join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(&explicit, b"x").unwrap();
        fs::write(lib.join("z.jar"), b"x").unwrap();
        let direct = base.join("direct.jar");
        fs::write(&direct, b"x").unwrap();

        let search: OsString = std::env::join_paths([lib.clone(), direct.clone()]).unwrap();
        let archives = resolve_archives(std::slice::from_ref(&explicit), Some(&search)).unwrap();
        assert_eq!(names(&archives), vec!["explicit.jar", "z.jar", "direct.jar"]);

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn split_search_path_drops_empty_segments() {
        let joined = std::env::join_paths(["a.jar", "", "lib"]).unwrap();
        assert_eq!(
            split_search_path(&joined),
            vec![PathBuf::from("a.jar"), PathBuf::from("lib")]
        );
    }

    #[test]
    fn real_path_is_absolute() {
        let base = temp_dir("class-lister-scan-real");
        let jar = base.join("a.jar");
        fs::write(&jar, b"x").unwrap();

        let archive = ArchiveFile::new(&jar);
        let real = archive.real_path().unwrap().to_path_buf();
        assert!(real.is_absolute());
        assert_eq!(archive.real_path().unwrap(), real.as_path());

        let _ = fs::remove_dir_all(base);
    }
}
