//! Filesystem access used by the walker
//!
//! The engine only needs two primitives: a metadata probe that does not
//! follow symbolic links, and a listing of a directory's immediate children.
//! Both are behind [`FileSystem`] so walks can run against the local disk or
//! an in-memory tree.

use super::types::EntryStat;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Metadata probe and directory listing primitives
#[async_trait]
pub trait FileSystem: Send + Sync + 'static {
    /// Read metadata for `path` without following symbolic links
    async fn symlink_metadata(&self, path: &Path) -> io::Result<EntryStat>;

    /// List the names of the immediate children of `path`
    ///
    /// Order is whatever the backend yields; it is not sorted.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;
}

#[async_trait]
impl<T: FileSystem + ?Sized> FileSystem for Arc<T> {
    async fn symlink_metadata(&self, path: &Path) -> io::Result<EntryStat> {
        (**self).symlink_metadata(path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        (**self).read_dir(path).await
    }
}

/// The local filesystem, through `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FileSystem for LocalFs {
    async fn symlink_metadata(&self, path: &Path) -> io::Result<EntryStat> {
        let meta = tokio::fs::symlink_metadata(path).await?;
        Ok(EntryStat::from_metadata(&meta))
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let mut dir = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name());
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::EntryType;

    #[tokio::test]
    async fn test_local_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"1").unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();

        let mut names = LocalFs.read_dir(dir.path()).await.unwrap();
        names.sort();
        assert_eq!(names, vec![OsString::from("a"), OsString::from("b")]);
    }

    #[tokio::test]
    async fn test_local_probe() {
        let dir = tempfile::tempdir().unwrap();
        let stat = LocalFs.symlink_metadata(dir.path()).await.unwrap();
        assert_eq!(stat.classify(), Some(EntryType::Directory));

        let err = LocalFs
            .symlink_metadata(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_probe_does_not_follow_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let stat = LocalFs.symlink_metadata(&link).await.unwrap();
        assert_eq!(stat.classify(), Some(EntryType::Symlink));
    }

    #[tokio::test]
    async fn test_arc_forwarding() {
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFs);
        let dir = tempfile::tempdir().unwrap();
        assert!(fs.read_dir(dir.path()).await.unwrap().is_empty());
    }
}
