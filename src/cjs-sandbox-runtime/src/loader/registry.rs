use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use rquickjs::{Ctx, Object, Persistent};
use tracing::debug;

/// The life cycle of a module record.
///
/// `Loading` is entered on insertion, before the body runs. `Loaded` and
/// `Failed` are terminal for the session. A record whose source could not be
/// read never leaves `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Loading,
    Loaded,
    Failed,
}

struct ModuleRecord {
    state: ModuleState,
    exports: Persistent<Object<'static>>,
}

/// Session-scoped mapping from canonical identity to module record.
///
/// At most one record exists per identity, and its exports object is the one
/// every requester receives. There is no eviction. Cloning the registry
/// yields another handle to the same records.
#[derive(Clone, Default)]
pub(crate) struct ModuleRegistry {
    records: Rc<RefCell<HashMap<String, ModuleRecord>>>,
}

impl ModuleRegistry {
    /// Returns the exports of an existing record, whatever its state.
    pub(crate) fn lookup<'js>(
        &self,
        ctx: &Ctx<'js>,
        identity: &str,
    ) -> Option<rquickjs::Result<Object<'js>>> {
        // Clone the handle out so the borrow is released before restoring.
        let exports = self.records.borrow().get(identity)?.exports.clone();
        Some(exports.restore(ctx))
    }

    /// Creates a `Loading` record with an empty exports object and returns
    /// that object.
    ///
    /// Must be called once per identity, before the module body starts.
    pub(crate) fn insert<'js>(
        &self,
        ctx: &Ctx<'js>,
        identity: &str,
    ) -> rquickjs::Result<Object<'js>> {
        let exports = Object::new(ctx.clone())?;
        let record = ModuleRecord {
            state: ModuleState::Loading,
            exports: Persistent::save(ctx, exports.clone()),
        };

        let previous = self
            .records
            .borrow_mut()
            .insert(identity.to_string(), record);
        debug_assert!(previous.is_none(), "module {identity:?} inserted twice");
        debug!(identity, "Inserted module record");

        Ok(exports)
    }

    pub(crate) fn set_state(&self, identity: &str, state: ModuleState) {
        if let Some(record) = self.records.borrow_mut().get_mut(identity) {
            record.state = state;
        }
    }

    pub(crate) fn state(&self, identity: &str) -> Option<ModuleState> {
        self.records.borrow().get(identity).map(|record| record.state)
    }

    pub(crate) fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.records.borrow().keys().cloned().collect();
        identities.sort();
        identities
    }

    /// Drops every record. Persistent handles must be released before the
    /// engine runtime is freed.
    pub(crate) fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use rquickjs::{Context, Runtime};

    use super::*;

    fn with_ctx(f: impl for<'js> FnOnce(Ctx<'js>, &ModuleRegistry)) {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        let registry = ModuleRegistry::default();
        context.with(|ctx| f(ctx, &registry));
        registry.clear();
    }

    #[test]
    fn lookup_misses_until_inserted() {
        with_ctx(|ctx, registry| {
            assert!(registry.lookup(&ctx, "/a.js").is_none());
            assert_eq!(registry.state("/a.js"), None);

            registry.insert(&ctx, "/a.js").unwrap();

            assert!(registry.lookup(&ctx, "/a.js").is_some());
            assert_eq!(registry.state("/a.js"), Some(ModuleState::Loading));
        });
    }

    #[test]
    fn lookup_returns_the_inserted_object() {
        with_ctx(|ctx, registry| {
            let inserted = registry.insert(&ctx, "/a.js").unwrap();
            inserted.set("marker", 42).unwrap();

            let found = registry.lookup(&ctx, "/a.js").unwrap().unwrap();
            let marker: i32 = found.get("marker").unwrap();
            assert_eq!(marker, 42);

            found.set("other", "x").unwrap();
            let other: String = inserted.get("other").unwrap();
            assert_eq!(other, "x");
        });
    }

    #[test]
    fn state_transitions_are_recorded() {
        with_ctx(|ctx, registry| {
            registry.insert(&ctx, "/ok.js").unwrap();
            registry.insert(&ctx, "/bad.js").unwrap();

            registry.set_state("/ok.js", ModuleState::Loaded);
            registry.set_state("/bad.js", ModuleState::Failed);
            registry.set_state("/unknown.js", ModuleState::Loaded);

            assert_eq!(registry.state("/ok.js"), Some(ModuleState::Loaded));
            assert_eq!(registry.state("/bad.js"), Some(ModuleState::Failed));
            assert_eq!(registry.state("/unknown.js"), None);
            assert_eq!(registry.identities(), ["/bad.js", "/ok.js"]);
        });
    }

    #[test]
    fn clones_share_records() {
        with_ctx(|ctx, registry| {
            let other = registry.clone();
            registry.insert(&ctx, "/shared.js").unwrap();
            assert!(other.lookup(&ctx, "/shared.js").is_some());

            other.clear();
            assert!(registry.lookup(&ctx, "/shared.js").is_none());
        });
    }
}
