//! Entry types and metadata snapshots
//!
//! These types describe what a metadata probe found at a path. A snapshot is
//! taken without following symbolic links, so a link is always reported as a
//! link regardless of its target.

use serde::Serialize;
use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
#[cfg(not(unix))]
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix file type bits
pub mod mode {
    /// Mask selecting the file type bits
    pub const S_IFMT: u32 = 0o170000;
    pub const S_IFSOCK: u32 = 0o140000;
    pub const S_IFLNK: u32 = 0o120000;
    pub const S_IFREG: u32 = 0o100000;
    pub const S_IFBLK: u32 = 0o060000;
    pub const S_IFDIR: u32 = 0o040000;
    pub const S_IFCHR: u32 = 0o020000;
    pub const S_IFIFO: u32 = 0o010000;
}

/// Type of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EntryType {
    /// Regular file
    File = 0,
    /// Directory
    Directory = 1,
    /// Symbolic link
    Symlink = 2,
    /// Block device
    BlockDevice = 3,
    /// Character device
    CharDevice = 4,
    /// Named pipe (FIFO)
    Fifo = 5,
    /// Unix socket
    Socket = 6,
}

impl EntryType {
    /// Every classification, in the order a stat is tested against them
    pub const PRIORITY: [EntryType; 7] = [
        EntryType::Directory,
        EntryType::Symlink,
        EntryType::BlockDevice,
        EntryType::CharDevice,
        EntryType::Fifo,
        EntryType::Socket,
        EntryType::File,
    ];

    /// The file type bits for this type
    pub fn mode_bits(&self) -> u32 {
        match self {
            EntryType::File => mode::S_IFREG,
            EntryType::Directory => mode::S_IFDIR,
            EntryType::Symlink => mode::S_IFLNK,
            EntryType::BlockDevice => mode::S_IFBLK,
            EntryType::CharDevice => mode::S_IFCHR,
            EntryType::Fifo => mode::S_IFIFO,
            EntryType::Socket => mode::S_IFSOCK,
        }
    }

    /// Short lowercase name used in output
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Directory => "dir",
            EntryType::Symlink => "symlink",
            EntryType::BlockDevice => "block_device",
            EntryType::CharDevice => "char_device",
            EntryType::Fifo => "fifo",
            EntryType::Socket => "socket",
        }
    }

    /// Check if this is a regular file
    pub fn is_file(&self) -> bool {
        *self == EntryType::File
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        *self == EntryType::Directory
    }

    /// Check if this is a symbolic link
    pub fn is_symlink(&self) -> bool {
        *self == EntryType::Symlink
    }
}

/// Metadata snapshot for a filesystem entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryStat {
    /// File mode (type + permissions)
    pub mode: u32,

    /// File size in bytes
    pub size: u64,

    /// Inode number
    pub inode: u64,

    /// Number of hard links
    pub nlink: u64,

    /// User ID
    pub uid: u32,

    /// Group ID
    pub gid: u32,

    /// Device containing the entry
    pub dev: u64,

    /// Device ID (for block and character devices)
    pub rdev: u64,

    /// Last access time (Unix timestamp)
    pub atime: Option<i64>,

    /// Last modification time (Unix timestamp)
    pub mtime: Option<i64>,

    /// Status change time (Unix timestamp)
    pub ctime: Option<i64>,

    /// Block size
    pub blksize: u64,

    /// Number of 512-byte blocks allocated
    pub blocks: u64,
}

impl EntryStat {
    /// Snapshot with only the mode set
    pub fn with_mode(mode: u32) -> Self {
        Self {
            mode,
            nlink: 1,
            ..Default::default()
        }
    }

    /// A directory with 0755 permissions
    pub fn directory() -> Self {
        Self::with_mode(mode::S_IFDIR | 0o755)
    }

    /// A regular file of `size` bytes with 0644 permissions
    pub fn file(size: u64) -> Self {
        Self {
            size,
            ..Self::with_mode(mode::S_IFREG | 0o644)
        }
    }

    /// A symbolic link
    pub fn symlink() -> Self {
        Self::with_mode(mode::S_IFLNK | 0o777)
    }

    /// Build a snapshot from `std::fs` metadata
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            mode: meta.mode(),
            size: meta.size(),
            inode: meta.ino(),
            nlink: meta.nlink(),
            uid: meta.uid(),
            gid: meta.gid(),
            dev: meta.dev(),
            rdev: meta.rdev(),
            atime: Some(meta.atime()),
            mtime: Some(meta.mtime()),
            ctime: Some(meta.ctime()),
            blksize: meta.blksize(),
            blocks: meta.blocks(),
        }
    }

    /// Build a snapshot from `std::fs` metadata
    ///
    /// Only directories, files and symlinks can be told apart here, so the
    /// mode is synthesized from the file type and the read-only flag.
    #[cfg(not(unix))]
    pub fn from_metadata(meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        let type_bits = if file_type.is_dir() {
            mode::S_IFDIR | 0o755
        } else if file_type.is_symlink() {
            mode::S_IFLNK | 0o777
        } else if file_type.is_file() {
            let perms = if meta.permissions().readonly() { 0o444 } else { 0o644 };
            mode::S_IFREG | perms
        } else {
            0
        };

        Self {
            mode: type_bits,
            size: meta.len(),
            nlink: 1,
            atime: meta.accessed().ok().and_then(to_unix_secs),
            mtime: meta.modified().ok().and_then(to_unix_secs),
            ..Default::default()
        }
    }

    pub fn is_dir(&self) -> bool {
        self.matches(EntryType::Directory)
    }

    pub fn is_symlink(&self) -> bool {
        self.matches(EntryType::Symlink)
    }

    pub fn is_block_device(&self) -> bool {
        self.matches(EntryType::BlockDevice)
    }

    pub fn is_char_device(&self) -> bool {
        self.matches(EntryType::CharDevice)
    }

    pub fn is_fifo(&self) -> bool {
        self.matches(EntryType::Fifo)
    }

    pub fn is_socket(&self) -> bool {
        self.matches(EntryType::Socket)
    }

    pub fn is_file(&self) -> bool {
        self.matches(EntryType::File)
    }

    /// Classify this entry
    ///
    /// Predicates are tested in [`EntryType::PRIORITY`] order and the first
    /// match wins. `None` means no predicate matched.
    pub fn classify(&self) -> Option<EntryType> {
        EntryType::PRIORITY
            .into_iter()
            .find(|kind| self.matches(*kind))
    }

    fn matches(&self, kind: EntryType) -> bool {
        (self.mode & mode::S_IFMT) == kind.mode_bits()
    }

    /// Permission bits without the type
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

#[cfg(not(unix))]
fn to_unix_secs(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
}

/// A classified entry, as handed to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Full path (root joined with every name on the way down)
    pub path: PathBuf,

    /// Entry type
    pub kind: EntryType,

    /// Metadata from the probe
    pub stat: EntryStat,
}

impl Entry {
    pub fn new(path: PathBuf, kind: EntryType, stat: EntryStat) -> Self {
        Self { path, kind, stat }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component
    pub fn name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }
}
