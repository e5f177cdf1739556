//! A read-only module set compiled into the binary.
//!
//! Embedded modules live under a virtual root `/`. Lookups accept paths with
//! or without the leading `/` (or `./`), and canonical paths are always
//! `/`-rooted so they can be used directly as module identities.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

pub use oxc_resolver::{FileMetadata, FileSystem, ResolveError};
use phf::Map;

/// File system implementation that serves modules compiled into the binary.
///
/// All module contents are stored in a compile-time perfect hash map, so no
/// filesystem access happens at runtime and the set of modules a session can
/// `require` is closed.
///
/// # Example
///
/// ```no_run
/// use cjs_sandbox::embed_modules;
///
/// let fs = embed_modules! {
///     "math.js" => "../tests/fixtures/math.js",
///     "strings.js" => "../tests/fixtures/strings.js",
/// };
/// ```
#[derive(Clone, Copy)]
pub struct FileSystemEmbedded {
    modules: &'static Map<&'static str, &'static str>,
}

impl FileSystemEmbedded {
    /// Create a new embedded file system with the given module map.
    ///
    /// See the `embed_modules!` macro for an easier way to create one.
    pub const fn new(modules: &'static Map<&'static str, &'static str>) -> Self {
        Self { modules }
    }

    /// Map a path to its key in the module map, without any leading `/` or `./`.
    fn key<'a>(path: &'a Path) -> io::Result<Cow<'a, str>> {
        let s = path
            .to_str()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid UTF-8 in path"))?;

        if s.contains('\\') || s.starts_with("./") || s.starts_with('/') {
            let normalized = s.replace('\\', "/");
            let trimmed = normalized.trim_start_matches("./").trim_start_matches('/');
            Ok(Cow::Owned(trimmed.trim_end_matches('/').to_string()))
        } else {
            Ok(Cow::Borrowed(s.trim_end_matches('/')))
        }
    }

    /// A key is a directory when some embedded module lives below it.
    fn is_directory(&self, key: &str) -> bool {
        if key.is_empty() {
            return !self.modules.is_empty();
        }

        let prefix = format!("{key}/");
        self.modules.keys().any(|module| module.starts_with(&prefix))
    }
}

impl FileSystem for FileSystemEmbedded {
    fn new() -> Self {
        unreachable!("Use embed_modules! macro to create FileSystemEmbedded");
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.read_to_string(path).map(String::into_bytes)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let key = Self::key(path)?;

        self.modules
            .get(key.as_ref())
            .map(|&content| content.to_string())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("Module '/{key}' not found"))
            })
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let key = Self::key(path)?;

        let is_file = self.modules.contains_key(key.as_ref());
        let is_dir = self.is_directory(&key);

        if !is_file && !is_dir {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Path '/{key}' not found"),
            ));
        }

        Ok(FileMetadata::new(is_file, is_dir, false /* is_symlink */))
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        self.metadata(path)
    }

    fn read_link(&self, _path: &Path) -> Result<PathBuf, ResolveError> {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "symlinks are not supported in embedded file system",
        )
        .into())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Self::key(path).map(|key| PathBuf::from(format!("/{key}")))
    }
}

/// Create an embedded file system with compile-time included modules.
///
/// Generates the `phf_map` and wraps it in a [`FileSystemEmbedded`]. Keys are
/// module paths below the virtual root, values are files to include (paths are
/// relative to the invoking source file) or, with `@inline`, literal sources.
///
/// ```no_run
/// use cjs_sandbox::{embed_modules, HostBuilder, Session};
///
/// let fs = embed_modules! {
///     "math.js" => "../tests/fixtures/math.js",
///     "strings.js" => "../tests/fixtures/strings.js",
/// };
///
/// let session = Session::new(HostBuilder::new().build(fs)).unwrap();
/// let exports = session.require("./math").unwrap();
/// ```
///
/// With inline content:
///
/// ```
/// use cjs_sandbox::embed_modules;
///
/// let fs = embed_modules! {
///     "test.js" => @inline "exports.test = true;",
/// };
/// ```
#[macro_export]
macro_rules! embed_modules {
    ($($key:expr => @inline $content:expr),* $(,)?) => {{
        use $crate::FileSystemEmbedded;
        use ::phf::{phf_map, Map};

        static EMBEDDED_MODULES: Map<&'static str, &'static str> = phf_map! {
            $(
                $key => $content,
            )*
        };

        FileSystemEmbedded::new(&EMBEDDED_MODULES)
    }};

    ($($key:expr => $file:expr),* $(,)?) => {{
        use $crate::FileSystemEmbedded;
        use ::phf::{phf_map, Map};

        static EMBEDDED_MODULES: Map<&'static str, &'static str> = phf_map! {
            $(
                $key => include_str!($file),
            )*
        };

        FileSystemEmbedded::new(&EMBEDDED_MODULES)
    }};
}
