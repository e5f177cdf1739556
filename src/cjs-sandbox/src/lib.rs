//! This crate runs CommonJS modules with a synchronous `require` inside an
//! embedded QuickJS engine, resolving them with `oxc_resolver`.
#![deny(dead_code, missing_docs, unused_mut)]
#![cfg_attr(not(any(test, debug_assertions)), warn(clippy::panic))]
#![cfg_attr(not(any(test, debug_assertions)), warn(clippy::expect_used))]
#![cfg_attr(not(any(test, debug_assertions)), warn(clippy::unwrap_used))]

mod builder;
mod host;
mod resolver;

/// A builder for a `ResolverHost`
pub use builder::HostBuilder;
/// The host capabilities a session needs: resolving and reading modules.
pub use cjs_sandbox_runtime::host::Host;
/// Live access to a module's exports from inside `Session::with`.
pub use cjs_sandbox_runtime::require;
/// The error returned by a top-level `require`.
pub use cjs_sandbox_runtime::LoadError;
/// The state of a record in a session's module registry.
pub use cjs_sandbox_runtime::ModuleState;
/// One script-execution session with its own engine and module registry.
pub use cjs_sandbox_runtime::Session;
/// The `code` carried by errors thrown into module bodies.
pub use cjs_sandbox_runtime::{MODULE_NOT_FOUND, MODULE_READ_FAILED};
/// A host resolving and reading modules through `oxc_resolver`.
pub use host::ResolverHost;
/// Module resolution and loading functionality.
pub use resolver::{FileMetadata, FileSystem, FileSystemEmbedded, ResolveError};
/// The local filesystem, for use with `HostBuilder::build`.
pub use oxc_resolver::FileSystemOs;
