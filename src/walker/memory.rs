//! In-memory filesystem
//!
//! A tree of [`EntryStat`] nodes keyed by path, with per-path latency and
//! injectable failures. Used to drive walks deterministically in tests and
//! benchmarks, and to simulate trees that are awkward to build on disk
//! (devices, unreadable directories, exotic entry types).

use super::fs::FileSystem;
use super::types::EntryStat;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
struct Node {
    stat: EntryStat,
    /// Child names in insertion order
    children: Vec<OsString>,
    probe_error: Option<io::ErrorKind>,
    list_error: Option<io::ErrorKind>,
    latency: Duration,
}

impl Node {
    fn new(stat: EntryStat) -> Self {
        Self {
            stat,
            children: Vec::new(),
            probe_error: None,
            list_error: None,
            latency: Duration::ZERO,
        }
    }
}

/// In-memory tree implementing [`FileSystem`]
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: RwLock<HashMap<PathBuf, Node>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the node at `path`
    ///
    /// Missing ancestors are created as directories and the name is appended
    /// to the parent's listing.
    pub fn insert(&self, path: impl Into<PathBuf>, stat: EntryStat) -> &Self {
        let path = path.into();
        let mut nodes = self.nodes.write();
        link_parent(&mut nodes, &path);
        nodes
            .entry(path)
            .and_modify(|node| node.stat = stat.clone())
            .or_insert_with(|| Node::new(stat));
        self
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) -> &Self {
        self.insert(path, EntryStat::directory())
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, size: u64) -> &Self {
        self.insert(path, EntryStat::file(size))
    }

    pub fn add_symlink(&self, path: impl Into<PathBuf>) -> &Self {
        self.insert(path, EntryStat::symlink())
    }

    /// Make the metadata probe of `path` fail with `kind`
    ///
    /// The path stays in its parent's listing, so this models an entry that
    /// vanished or became unreadable between listing and probing.
    pub fn fail_probe(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> &Self {
        self.with_node(path.into(), |node| node.probe_error = Some(kind))
    }

    /// Make listing the directory at `path` fail with `kind`
    pub fn fail_listing(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> &Self {
        self.with_node(path.into(), |node| node.list_error = Some(kind))
    }

    /// Delay every probe and listing of `path`
    pub fn set_latency(&self, path: impl Into<PathBuf>, latency: Duration) -> &Self {
        self.with_node(path.into(), |node| node.latency = latency)
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    fn with_node(&self, path: PathBuf, update: impl FnOnce(&mut Node)) -> &Self {
        let mut nodes = self.nodes.write();
        if !nodes.contains_key(&path) {
            link_parent(&mut nodes, &path);
            nodes.insert(path.clone(), Node::new(EntryStat::file(0)));
        }
        if let Some(node) = nodes.get_mut(&path) {
            update(node);
        }
        self
    }

    fn lookup(&self, path: &Path) -> io::Result<Node> {
        self.nodes.read().get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file or directory: {}", path.display()),
            )
        })
    }
}

fn link_parent(nodes: &mut HashMap<PathBuf, Node>, path: &Path) {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return;
    };
    if parent.as_os_str().is_empty() {
        return;
    }

    if !nodes.contains_key(parent) {
        link_parent(nodes, parent);
        nodes.insert(parent.to_path_buf(), Node::new(EntryStat::directory()));
    }

    if let Some(node) = nodes.get_mut(parent) {
        if !node.children.iter().any(|child| child == name) {
            node.children.push(name.to_os_string());
        }
    }
}

fn injected(kind: io::ErrorKind, path: &Path) -> io::Error {
    io::Error::new(kind, format!("injected failure: {}", path.display()))
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn symlink_metadata(&self, path: &Path) -> io::Result<EntryStat> {
        let node = self.lookup(path)?;
        if !node.latency.is_zero() {
            tokio::time::sleep(node.latency).await;
        }
        match node.probe_error {
            Some(kind) => Err(injected(kind, path)),
            None => Ok(node.stat),
        }
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let node = self.lookup(path)?;
        if !node.latency.is_zero() {
            tokio::time::sleep(node.latency).await;
        }
        if let Some(kind) = node.list_error {
            return Err(injected(kind, path));
        }
        if !node.stat.is_dir() {
            return Err(io::Error::other(format!(
                "not a directory: {}",
                path.display()
            )));
        }
        Ok(node.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::EntryType;

    #[tokio::test]
    async fn test_parents_created() {
        let fs = MemoryFs::new();
        fs.add_file("/r/b/c.txt", 3);

        let stat = fs.symlink_metadata(Path::new("/r/b")).await.unwrap();
        assert_eq!(stat.classify(), Some(EntryType::Directory));

        let names = fs.read_dir(Path::new("/r")).await.unwrap();
        assert_eq!(names, vec![OsString::from("b")]);
        assert_eq!(fs.len(), 4); // "/", "/r", "/r/b", "/r/b/c.txt"
    }

    #[tokio::test]
    async fn test_listing_keeps_insertion_order() {
        let fs = MemoryFs::new();
        fs.add_file("/r/z", 0).add_file("/r/a", 0).add_file("/r/m", 0);
        fs.add_file("/r/a", 10);

        let names = fs.read_dir(Path::new("/r")).await.unwrap();
        assert_eq!(
            names,
            vec![OsString::from("z"), OsString::from("a"), OsString::from("m")]
        );

        let stat = fs.symlink_metadata(Path::new("/r/a")).await.unwrap();
        assert_eq!(stat.size, 10);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let fs = MemoryFs::new();
        fs.add_dir("/r/locked")
            .fail_listing("/r/locked", io::ErrorKind::PermissionDenied)
            .fail_probe("/r/gone", io::ErrorKind::NotFound);

        let err = fs.read_dir(Path::new("/r/locked")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        let err = fs.symlink_metadata(Path::new("/r/gone")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let names = fs.read_dir(Path::new("/r")).await.unwrap();
        assert!(names.contains(&OsString::from("gone")));
    }

    #[tokio::test]
    async fn test_missing_and_non_directory() {
        let fs = MemoryFs::new();
        fs.add_file("/r/file", 1);

        let err = fs.symlink_metadata(Path::new("/nope")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(fs.read_dir(Path::new("/r/file")).await.is_err());
    }
}
