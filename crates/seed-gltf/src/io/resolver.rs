//! Resolution of satellite resources referenced by URI.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::uri::percent_decode;
use crate::error::{GltfError, Result};

/// Source of satellite files for the read pipeline.
pub trait FileReader {
    /// Fetch the bytes behind a relative URI.
    fn read(&self, uri: &str) -> Result<Arc<[u8]>>;

    /// Full location of a relative URI, when the reader has one.
    fn resolve_full_path(&self, _uri: &str) -> Option<String> {
        None
    }
}

/// Sink for the documents and satellite files of the write pipeline.
pub trait FileWriter {
    /// Store `bytes` under a relative URI.
    fn write(&mut self, uri: &str, bytes: &[u8]) -> Result<()>;
}

/// Reads and writes files relative to a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    /// Resolve URIs relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolver for the directory containing `path`, plus the file name.
    pub fn for_file(path: &Path) -> Result<(Self, String)> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                GltfError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", path.display()),
                ))
            })?
            .to_string();
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok((Self::new(root), file_name))
    }

    /// The directory URIs are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of `uri` under the root. URIs that would leave the root
    /// (parent segments, absolute paths, drive prefixes) are refused.
    fn path_of(&self, uri: &str) -> Result<PathBuf> {
        let relative = PathBuf::from(percent_decode(uri)?);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(GltfError::format(format!(
                "uri {} points outside {}",
                uri,
                self.root.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl FileReader for DirectoryResolver {
    fn read(&self, uri: &str) -> Result<Arc<[u8]>> {
        let path = self.path_of(uri)?;
        trace!(path = %path.display(), "reading satellite file");
        let bytes = fs::read(&path).map_err(|e| {
            GltfError::Io(io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Ok(bytes.into())
    }

    fn resolve_full_path(&self, uri: &str) -> Option<String> {
        self.path_of(uri)
            .ok()
            .map(|path| path.display().to_string())
    }
}

impl FileWriter for DirectoryResolver {
    fn write(&mut self, uri: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_of(uri)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
        Ok(())
    }
}

/// Files held in memory, keyed by percent-decoded URI.
///
/// Bytes handed out by [`FileReader::read`] share storage with the resolver.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: IndexMap<String, Arc<[u8]>>,
}

impl MemoryResolver {
    /// An empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, uri: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.files.insert(uri.into(), bytes.into());
    }

    /// Bytes stored under `uri`.
    pub fn get(&self, uri: &str) -> Option<&Arc<[u8]>> {
        self.files.get(uri)
    }

    /// Stored URIs, in insertion order.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if no file is stored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileReader for MemoryResolver {
    fn read(&self, uri: &str) -> Result<Arc<[u8]>> {
        if let Some(bytes) = self.files.get(uri) {
            return Ok(Arc::clone(bytes));
        }
        let decoded = percent_decode(uri)?;
        self.files.get(&decoded).map(Arc::clone).ok_or_else(|| {
            GltfError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory file named {}", decoded),
            ))
        })
    }
}

impl FileWriter for MemoryResolver {
    fn write(&mut self, uri: &str, bytes: &[u8]) -> Result<()> {
        self.insert(percent_decode(uri)?, bytes);
        Ok(())
    }
}
