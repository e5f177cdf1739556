use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use cjs_sandbox_runtime::host::Host;
use oxc_resolver::{ResolveOptions, ResolverGeneric};
use tracing::debug;

use crate::resolver::FileSystem;

/// Extensions of sources the loader can execute as-is. There is no transpile
/// step, so TypeScript, JSX and ES module files are rejected at resolution.
const ALLOWED_EXTENSIONS: &[&str] = &["js", "cjs"];

/// A [`Host`] that resolves and reads modules through `oxc_resolver`.
///
/// Identities are the resolved paths with `/` separators. A specifier is
/// resolved from the directory containing the requiring module, or from the
/// root directory when required at the top level.
///
/// Use [`HostBuilder`](crate::HostBuilder) to create one.
pub struct ResolverHost<Fs: FileSystem> {
    resolver: ResolverGeneric<Fs>,
    file_system: Fs,
    root: PathBuf,
}

impl<Fs: FileSystem + Clone + 'static> ResolverHost<Fs> {
    pub(crate) fn new(file_system: Fs, root: PathBuf, options: ResolveOptions) -> Self {
        Self {
            resolver: ResolverGeneric::new_with_file_system(file_system.clone(), options),
            file_system,
            root,
        }
    }
}

impl<Fs: FileSystem> ResolverHost<Fs> {
    /// The directory top-level specifiers are resolved from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl<Fs: FileSystem> Host for ResolverHost<Fs> {
    fn resolve_module(&self, base: Option<String>, name: String) -> Result<String> {
        check_extension(&name)?;

        let directory = match &base {
            Some(base) => Path::new(base)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone()),
            None => self.root.clone(),
        };

        debug!(
            base = ?base,
            specifier = %name,
            directory = %directory.display(),
            "Resolving module"
        );

        let resolved = self
            .resolver
            .resolve(&directory, &name)
            .with_context(|| format!("Failed to resolve module '{name}' from {directory:?}"))?;

        let path = resolved.path();
        if !is_executable(path) {
            bail!("Module '{name}' resolved to {path:?}, which is not a CommonJS script");
        }

        Ok(normalize(path))
    }

    fn load_module(&self, identity: String) -> Result<String> {
        debug!(path = %identity, "Loading module");

        self.file_system
            .read_to_string(Path::new(&identity))
            .with_context(|| format!("Failed to read module '{identity}'"))
    }
}

/// Reject relative and absolute specifiers naming an extension the loader
/// cannot execute. Bare specifiers are checked once resolved.
fn check_extension(name: &str) -> Result<()> {
    let is_path = name.starts_with('/')
        || name.starts_with("./")
        || name.starts_with("../")
        || name == "."
        || name == "..";
    if !is_path {
        return Ok(());
    }

    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ALLOWED_EXTENSIONS.contains(&ext) => {
            bail!("invalid resolver extension: {ext}")
        }
        _ => Ok(()),
    }
}

fn is_executable(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => ext.to_str().is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext)),
        None => true,
    }
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
