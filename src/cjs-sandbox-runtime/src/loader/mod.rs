use std::rc::Rc;

use anyhow::{Context as _, bail, ensure};
use rquickjs::{Ctx, JsLifetime, Object};
use tracing::{debug, instrument, warn};

use crate::error::{Fault, LoadError};
use crate::host::Host;
use crate::metrics;
use crate::modules::{self, BuiltinInit};

pub(crate) mod context;
mod executor;
pub(crate) mod registry;

use executor::ModuleCompiler;
use registry::{ModuleRegistry, ModuleState};

/// The loader state of a session: the host capabilities, the registry and
/// the compiler for module sources.
///
/// It is stored as userdata in the context so that the `require` functions
/// handed to module bodies can reach it. Cloning is cheap and shares state.
#[derive(Clone, JsLifetime)]
pub(crate) struct ModuleLoader {
    host: Rc<dyn Host>,
    pub(crate) registry: ModuleRegistry,
    compiler: ModuleCompiler,
}

/// Where a specifier resolved to.
enum Resolved {
    Builtin(&'static str, BuiltinInit),
    Host(String),
}

impl Resolved {
    fn identity(&self) -> &str {
        match self {
            Resolved::Builtin(name, _) => name,
            Resolved::Host(identity) => identity,
        }
    }
}

impl ModuleLoader {
    pub(crate) fn new(host: impl Host + 'static) -> Self {
        Self {
            host: Rc::new(host),
            registry: ModuleRegistry::default(),
            compiler: ModuleCompiler::default(),
        }
    }

    pub(crate) fn install(&self, ctx: &Ctx<'_>) -> anyhow::Result<()> {
        ensure!(
            ctx.userdata::<Self>().is_none(),
            "ModuleLoader is already installed"
        );
        self.compiler
            .capture(ctx)
            .context("Unable to capture the Function constructor")?;
        let Ok(None) = ctx.store_userdata(self.clone()) else {
            bail!("Failed to install ModuleLoader");
        };
        Ok(())
    }

    /// Releases every engine handle held by the loader.
    pub(crate) fn release(&self) {
        self.registry.clear();
        self.compiler.clear();
    }

    /// Marks a record `Failed` after its body faulted. Its partial exports
    /// stay cached.
    pub(crate) fn mark_failed(&self, identity: &str, error: rquickjs::Error) -> Fault {
        self.registry.set_state(identity, ModuleState::Failed);
        warn!(identity, "Module body faulted, partial exports stay cached");
        metrics::record_failure_kind("execution");
        Fault::Thrown {
            identity: identity.to_string(),
            error,
        }
    }

    fn from_ctx(ctx: &Ctx<'_>) -> Result<Self, Fault> {
        // Clone out of the guard, module bodies re-enter this path.
        ctx.userdata::<Self>()
            .map(|loader| loader.clone())
            .ok_or_else(|| Fault::runtime("ModuleLoader not found in context"))
    }

    fn resolve(&self, specifier: &str, base: Option<&str>) -> Result<Resolved, LoadError> {
        if let Some((name, init)) = modules::builtin(specifier) {
            return Ok(Resolved::Builtin(name, init));
        }

        debug!(specifier, base, "Resolving module");
        let identity = self
            .host
            .resolve_module(base.map(str::to_string), specifier.to_string())
            .map_err(|e| LoadError::resolution(specifier, base, e))?;

        Ok(Resolved::Host(identity))
    }
}

/// Require a module from the host side of a session.
///
/// Returns the live exports object of the module. Every call for the same
/// canonical identity within a session returns the same object, even when
/// the module is still loading or has failed before.
pub fn require<'js>(ctx: &Ctx<'js>, specifier: &str) -> Result<Object<'js>, LoadError> {
    require_from(ctx, specifier, None).map_err(|fault| fault.into_load_error(ctx))
}

/// The loader entry point shared by the host API and module bodies.
#[instrument(skip(ctx), level = "debug")]
pub(crate) fn require_from<'js>(
    ctx: &Ctx<'js>,
    specifier: &str,
    base: Option<&str>,
) -> Result<Object<'js>, Fault> {
    let loader = ModuleLoader::from_ctx(ctx)?;
    let resolved = loader
        .resolve(specifier, base)
        .inspect_err(metrics::record_failure)?;
    let identity = resolved.identity();

    if let Some(exports) = loader.registry.lookup(ctx, identity) {
        debug!(identity, "Module cache hit");
        metrics::record_cache_hit();
        return exports.map_err(Fault::runtime);
    }

    // Visible in the registry before the body runs, so cyclic requests see
    // the in-progress exports instead of loading again.
    let exports = loader
        .registry
        .insert(ctx, identity)
        .map_err(Fault::runtime)?;

    match resolved {
        Resolved::Builtin(name, init) => {
            if let Err(error) = init(ctx, &exports) {
                return Err(loader.mark_failed(name, error));
            }
            loader.registry.set_state(name, ModuleState::Loaded);
        }
        Resolved::Host(ref identity) => {
            executor::execute(ctx, &loader, identity, exports.clone())?;
        }
    }

    metrics::record_loaded();
    Ok(exports)
}
