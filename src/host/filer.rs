//! Output side of a round: generated source files

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::DeclId;

/// Sink for generated compilation units
///
/// Each call writes one complete file; there are no partial writes. A name
/// can be created once per round; a second write fails with
/// [`io::ErrorKind::AlreadyExists`].
pub trait Filer {
    /// `name` is the fully qualified class name, e.g. `com.example.Hello`.
    /// `originating` lists the declarations the file was produced from.
    fn write_source_file(&mut self, name: &str, originating: &[DeclId], contents: &str) -> io::Result<()>;
}

/// Writes `<root>/<package path>/<Name>.java`
#[derive(Debug)]
pub struct DirectoryFiler {
    root: PathBuf,
    created: BTreeSet<String>,
    written: Vec<PathBuf>,
    unchanged: Vec<PathBuf>,
}

impl DirectoryFiler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryFiler {
            root: root.into(),
            created: BTreeSet::new(),
            written: Vec::new(),
            unchanged: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files whose contents changed (or were created) this round
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Files that already had identical contents and were left alone
    pub fn unchanged(&self) -> &[PathBuf] {
        &self.unchanged
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments: Vec<&str> = name.split('.').collect();
        let class = segments.pop().unwrap_or(name);
        for segment in segments {
            path.push(segment);
        }
        path.push(format!("{}.java", class));
        path
    }
}

impl Filer for DirectoryFiler {
    fn write_source_file(&mut self, name: &str, originating: &[DeclId], contents: &str) -> io::Result<()> {
        if !self.created.insert(name.to_string()) {
            return Err(recreate_error(name));
        }
        let path = self.path_for(name);

        if let Ok(existing) = fs::read_to_string(&path) {
            if hash_content(&existing) == hash_content(contents) {
                log::debug!("{} is up to date", path.display());
                self.unchanged.push(path);
                return Ok(());
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        log::debug!(
            "wrote {} ({} originating declarations)",
            path.display(),
            originating.len()
        );
        self.written.push(path);
        Ok(())
    }
}

/// A source kept in memory by [`MemoryFiler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySource {
    pub originating: Vec<DeclId>,
    pub contents: String,
}

/// Keeps generated sources in memory, keyed by qualified name
#[derive(Debug, Default)]
pub struct MemoryFiler {
    sources: BTreeMap<String, MemorySource>,
    failing: Vec<String>,
}

impl MemoryFiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write of `name` fail with an I/O error
    pub fn fail_on(&mut self, name: &str) {
        self.failing.push(name.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(|source| source.contents.as_str())
    }

    pub fn sources(&self) -> &BTreeMap<String, MemorySource> {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Filer for MemoryFiler {
    fn write_source_file(&mut self, name: &str, originating: &[DeclId], contents: &str) -> io::Result<()> {
        if self.failing.iter().any(|failing| failing == name) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot create {}", name),
            ));
        }
        if self.sources.contains_key(name) {
            return Err(recreate_error(name));
        }
        self.sources.insert(
            name.to_string(),
            MemorySource {
                originating: originating.to_vec(),
                contents: contents.to_string(),
            },
        );
        Ok(())
    }
}

fn recreate_error(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("attempt to recreate {}", name),
    )
}

/// SHA-256 of `content`, hex encoded
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_qualified_name() {
        let filer = DirectoryFiler::new("out");
        assert_eq!(
            filer.path_for("com.example.Hello"),
            Path::new("out").join("com").join("example").join("Hello.java")
        );
        assert_eq!(filer.path_for("Hello"), Path::new("out").join("Hello.java"));
    }

    #[test]
    fn test_directory_filer_skips_identical_contents() {
        let temp_dir = tempfile::tempdir().unwrap();

        let mut first = DirectoryFiler::new(temp_dir.path());
        first.write_source_file("a.B", &[], "class B {}\n").unwrap();
        assert_eq!(first.written().len(), 1);

        let mut second = DirectoryFiler::new(temp_dir.path());
        second.write_source_file("a.B", &[], "class B {}\n").unwrap();
        assert!(second.written().is_empty());
        assert_eq!(second.unchanged().len(), 1);

        let mut third = DirectoryFiler::new(temp_dir.path());
        third.write_source_file("a.B", &[], "final class B {}\n").unwrap();
        assert_eq!(third.written().len(), 1);
        let on_disk = fs::read_to_string(temp_dir.path().join("a/B.java")).unwrap();
        assert_eq!(on_disk, "final class B {}\n");
    }

    #[test]
    fn test_directory_filer_rejects_recreation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut filer = DirectoryFiler::new(temp_dir.path());

        filer.write_source_file("a.B", &[], "class B {}\n").unwrap();
        let err = filer
            .write_source_file("a.B", &[], "final class B {}\n")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(err.to_string(), "attempt to recreate a.B");

        let on_disk = fs::read_to_string(temp_dir.path().join("a/B.java")).unwrap();
        assert_eq!(on_disk, "class B {}\n");
        assert_eq!(filer.written().len(), 1);
    }

    #[test]
    fn test_memory_filer_rejects_recreation() {
        let mut filer = MemoryFiler::new();
        filer.write_source_file("a.B", &[DeclId(3)], "x").unwrap();
        assert!(filer.write_source_file("a.B", &[], "y").is_err());
        assert_eq!(filer.get("a.B"), Some("x"));
        assert_eq!(filer.sources()["a.B"].originating, vec![DeclId(3)]);
    }

    #[test]
    fn test_hash_content_is_stable() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abd"));
        assert_eq!(hash_content("").len(), 64);
    }
}
