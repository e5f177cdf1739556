use std::path::PathBuf;

use anyhow::{Context as _, Result};
use oxc_resolver::{FileSystemOs, ResolveOptions};

use crate::host::ResolverHost;
use crate::resolver::FileSystem;

const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".cjs"];
const DEFAULT_CONDITION_NAMES: &[&str] = &["require", "node"];

/// A builder for a [`ResolverHost`]
pub struct HostBuilder {
    root: Option<PathBuf>,
    extensions: Vec<String>,
    condition_names: Vec<String>,
}

impl HostBuilder {
    /// Create a new HostBuilder
    pub fn new() -> Self {
        Self {
            root: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            condition_names: DEFAULT_CONDITION_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Set the directory top-level specifiers are resolved from.
    ///
    /// Defaults to `/` for [`build`](Self::build) and to the current working
    /// directory for [`build_os`](Self::build_os).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the extensions tried, in order, for extensionless specifiers.
    /// The default is `.js` then `.cjs`.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the `exports` condition names matched in `package.json`.
    /// The default is `require` then `node`.
    pub fn with_condition_names<I, S>(mut self, condition_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.condition_names = condition_names.into_iter().map(Into::into).collect();
        self
    }

    /// Build a host backed by the given file system.
    pub fn build<Fs: FileSystem + Clone + 'static>(self, file_system: Fs) -> ResolverHost<Fs> {
        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("/"));
        ResolverHost::new(file_system, root, self.options())
    }

    /// Build a host backed by the local filesystem.
    pub fn build_os(self) -> Result<ResolverHost<FileSystemOs>> {
        let root = match self.root.clone() {
            Some(root) => root,
            None => std::env::current_dir().context("Unable to get current directory")?,
        };
        Ok(ResolverHost::new(FileSystemOs::new(), root, self.options()))
    }

    fn options(self) -> ResolveOptions {
        ResolveOptions {
            extensions: self.extensions,
            condition_names: self.condition_names,
            ..Default::default()
        }
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}
