//! A synchronous CommonJS `require` for an embedded QuickJS engine.
//!
//! Module bodies are executed once per [`Session`], in a scope holding exactly
//! four bindings: `exports`, `require`, `__filename` and `__dirname`. Their
//! exports objects are memoized by canonical identity, so every requester,
//! including one inside a `require` cycle, observes the same object.

mod error;
mod globals;
pub mod host;
mod loader;
mod metrics;
mod modules;

use anyhow::Context as _;
use rquickjs::{Context, Ctx, Runtime};
use tracing::instrument;

pub use crate::error::{LoadError, MODULE_NOT_FOUND, MODULE_READ_FAILED};
use crate::host::Host;
pub use crate::loader::registry::ModuleState;
pub use crate::loader::require;
use crate::loader::ModuleLoader;
use crate::metrics::SessionMetricsGuard;

/// One script-execution session.
///
/// A session owns its own engine runtime and a fresh, empty module registry.
/// Nothing is shared between sessions, even when they use the same host.
/// Records are never evicted while the session lives.
pub struct Session {
    loader: ModuleLoader,
    context: Context,
    _metric_guard: SessionMetricsGuard,
}

impl Session {
    /// Create a new `Session` backed by the given host.
    /// The resulting session has its globals and module loader installed.
    #[instrument(skip_all, level = "info")]
    pub fn new<H: Host + 'static>(host: H) -> anyhow::Result<Self> {
        let runtime = Runtime::new().context("Unable to initialize JS runtime")?;
        let context = Context::full(&runtime).context("Unable to create JS context")?;

        let loader = ModuleLoader::new(host);

        let setup = context.with(|ctx| -> anyhow::Result<()> {
            // The loader must be installed first, globals are built from
            // built-in modules.
            loader.install(&ctx)?;
            globals::setup(&ctx)
        });
        if let Err(err) = setup {
            loader.release();
            return Err(err);
        }

        Ok(Self {
            loader,
            context,
            _metric_guard: SessionMetricsGuard::new(),
        })
    }

    /// Require a module by specifier, as the entry point of the session.
    ///
    /// Returns the module's exports serialized as JSON. Functions and other
    /// values without a JSON form are omitted, as `JSON.stringify` does.
    #[instrument(skip(self), level = "info")]
    pub fn require(&self, specifier: &str) -> Result<String, LoadError> {
        self.context.with(|ctx| {
            let exports = require(&ctx, specifier)?;
            let json = ctx
                .json_stringify(exports)
                .and_then(|json| json.map(|s| s.to_string()).transpose())
                .map_err(|e| LoadError::Runtime {
                    message: format!("Serializing exports of {specifier:?}: {e}"),
                })?;
            Ok(json.unwrap_or_else(|| "undefined".to_string()))
        })
    }

    /// Run a closure inside the session's engine context.
    ///
    /// This gives access to live exports objects through [`require`].
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: for<'js> FnOnce(Ctx<'js>) -> R,
    {
        self.context.with(f)
    }

    /// The state of the record for a canonical identity, if one exists.
    pub fn module_state(&self, identity: &str) -> Option<ModuleState> {
        self.loader.registry.state(identity)
    }

    /// The canonical identities of every record in the registry, sorted.
    pub fn modules(&self) -> Vec<String> {
        self.loader.registry.identities()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Release the persistent engine handles before the context is dropped,
        // otherwise the runtime aborts on drop due to the leak.
        self.loader.release();
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::collections::HashMap;

    use anyhow::{Context as _, Result};

    use crate::host::Host;

    /// A host serving modules from memory, where identities equal specifiers.
    pub(crate) struct MapHost {
        modules: HashMap<String, String>,
    }

    impl MapHost {
        pub(crate) fn new<const N: usize>(modules: [(&str, &str); N]) -> Self {
            Self {
                modules: modules
                    .into_iter()
                    .map(|(name, source)| (name.to_string(), source.to_string()))
                    .collect(),
            }
        }
    }

    impl Host for MapHost {
        fn resolve_module(&self, _base: Option<String>, name: String) -> Result<String> {
            self.modules
                .contains_key(&name)
                .then_some(name)
                .context("no such module")
        }

        fn load_module(&self, identity: String) -> Result<String> {
            self.modules
                .get(&identity)
                .cloned()
                .with_context(|| format!("cannot read {identity:?}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::MapHost;
    use super::*;

    #[test]
    fn console_global_is_the_builtin_module() {
        let session = Session::new(MapHost::new([(
            "main",
            "exports.same = console === require('console');",
        )]))
        .unwrap();

        assert_eq!(session.require("main").unwrap(), r#"{"same":true}"#);
        assert_eq!(session.modules(), ["console", "main"]);
    }

    #[test]
    fn module_bodies_see_exactly_four_bindings() {
        let session = Session::new(MapHost::new([(
            "main",
            r#"
            exports.arity = arguments.length;
            exports.filename = __filename;
            exports.dirname = __dirname;
            exports.thisIsExports = this === exports;
            exports.requireName = require.name;
            exports.noGlobalRequire = typeof globalThis.require === 'undefined';
            "#,
        )]))
        .unwrap();

        assert_eq!(
            session.require("main").unwrap(),
            r#"{"arity":4,"filename":"main","dirname":"main","thisIsExports":true,"requireName":"require","noGlobalRequire":true}"#
        );
    }

    #[test]
    fn reassigning_a_binding_does_not_replace_exports() {
        let session = Session::new(MapHost::new([(
            "main",
            "exports.kept = 1; exports = { replaced: true }; exports.ignored = 2;",
        )]))
        .unwrap();

        assert_eq!(session.require("main").unwrap(), r#"{"kept":1}"#);
        assert_eq!(session.module_state("main"), Some(ModuleState::Loaded));
    }
}
