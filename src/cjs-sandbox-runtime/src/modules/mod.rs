use rquickjs::{Ctx, Object, Result};

pub mod console;
pub mod path;

/// A native initializer that populates the exports object of a built-in module.
pub(crate) type BuiltinInit = for<'js> fn(&Ctx<'js>, &Object<'js>) -> Result<()>;

// Built-ins resolve to their own name, ahead of the host resolver.
static BUILTIN_MODULES: &[(&str, BuiltinInit)] = &[
    ("console", console::init),
    ("path", path::init),
];

pub(crate) fn builtin(name: &str) -> Option<(&'static str, BuiltinInit)> {
    BUILTIN_MODULES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .copied()
}
