use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use rquickjs::{Ctx, Exception, Function, Object, Persistent};
use tracing::{debug, instrument, warn};

use super::context::{MODULE_PARAMS, SandboxContext};
use super::registry::ModuleState;
use super::ModuleLoader;
use crate::error::{Fault, LoadError};
use crate::metrics;

/// Drive one host module from `Loading` to `Loaded` or `Failed`.
///
/// The record for `identity` must already be in the registry, with `exports`
/// as its exports object. If the source cannot be read the record is left
/// untouched, still `Loading` with empty exports. If the body faults the
/// record becomes `Failed` and keeps whatever the body had exported so far.
#[instrument(skip(ctx, loader, exports), level = "debug")]
pub(crate) fn execute<'js>(
    ctx: &Ctx<'js>,
    loader: &ModuleLoader,
    identity: &str,
    exports: Object<'js>,
) -> Result<(), Fault> {
    let source = read_source(loader, identity).inspect_err(|err| {
        warn!(identity, "Module source unavailable, record stays cached");
        metrics::record_failure(err);
    })?;

    let result = loader
        .compiler
        .compile(ctx, &source)
        .and_then(|body| SandboxContext::build(ctx, identity, exports)?.invoke(&body));

    match result {
        Ok(()) => {
            loader.registry.set_state(identity, ModuleState::Loaded);
            debug!(identity, "Module loaded");
            Ok(())
        }
        Err(error) => Err(loader.mark_failed(identity, error)),
    }
}

fn read_source(loader: &ModuleLoader, identity: &str) -> Result<String, LoadError> {
    debug!(identity, "Reading module source");
    let source = loader
        .host
        .load_module(identity.to_string())
        .map_err(|e| LoadError::read(identity, e))?;

    if source.is_empty() {
        return Err(LoadError::read(identity, anyhow!("module source is empty")));
    }

    Ok(source)
}

/// Compiles module sources with the session's intrinsic `Function` constructor.
///
/// The constructor is captured once, when the loader is installed and before
/// any module body runs. Module bodies can replace or delete the global
/// `Function` without affecting how later modules are compiled.
#[derive(Clone, Default)]
pub(crate) struct ModuleCompiler {
    constructor: Rc<RefCell<Option<Persistent<Function<'static>>>>>,
}

impl ModuleCompiler {
    pub(crate) fn capture(&self, ctx: &Ctx<'_>) -> rquickjs::Result<()> {
        let constructor: Function = ctx.globals().get("Function")?;
        *self.constructor.borrow_mut() = Some(Persistent::save(ctx, constructor));
        Ok(())
    }

    /// Compile the source as a function taking the sandbox bindings as parameters.
    pub(crate) fn compile<'js>(
        &self,
        ctx: &Ctx<'js>,
        source: &str,
    ) -> rquickjs::Result<Function<'js>> {
        // Clone the handle out so the borrow is released before the call.
        let Some(constructor) = self.constructor.borrow().clone() else {
            return Err(Exception::throw_internal(ctx, "Module compiler not installed"));
        };
        let constructor = constructor.restore(ctx)?;
        constructor.call((MODULE_PARAMS, source))
    }

    /// Releases the captured constructor. Must happen before the engine
    /// runtime is freed.
    pub(crate) fn clear(&self) {
        self.constructor.borrow_mut().take();
    }
}
