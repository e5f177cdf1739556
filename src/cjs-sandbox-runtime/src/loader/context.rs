use std::rc::Rc;

use rquickjs::function::This;
use rquickjs::{Ctx, Function, Object};

use super::require_from;

/// Parameter list of the function a module body is compiled into.
/// Order matches the arguments passed by [`SandboxContext::invoke`].
pub(crate) const MODULE_PARAMS: &str = "exports, require, __filename, __dirname";

/// The fixed set of bindings visible to a module body.
///
/// The set itself cannot be altered by the body: the bindings are passed as
/// arguments, so reassigning one only rebinds a local. The exports object is
/// shared by reference with the registry, and its contents stay mutable.
pub(crate) struct SandboxContext<'js> {
    exports: Object<'js>,
    require: Function<'js>,
    filename: String,
    dirname: String,
}

impl<'js> SandboxContext<'js> {
    pub(crate) fn build(
        ctx: &Ctx<'js>,
        identity: &str,
        exports: Object<'js>,
    ) -> rquickjs::Result<Self> {
        Ok(Self {
            exports,
            require: bound_require(ctx, identity)?,
            filename: identity.to_string(),
            dirname: dirname_of(identity).to_string(),
        })
    }

    /// Call the compiled body once, with `this` bound to the exports object.
    pub(crate) fn invoke(self, body: &Function<'js>) -> rquickjs::Result<()> {
        body.call((
            This(self.exports.clone()),
            self.exports,
            self.require,
            self.filename,
            self.dirname,
        ))
    }
}

/// A `require` function that resolves relative to `identity`.
fn bound_require<'js>(ctx: &Ctx<'js>, identity: &str) -> rquickjs::Result<Function<'js>> {
    let base: Rc<str> = Rc::from(identity);
    let require = move |ctx: Ctx<'js>, specifier: String| -> rquickjs::Result<Object<'js>> {
        require_from(&ctx, &specifier, Some(&*base)).map_err(|fault| fault.throw(&ctx))
    };
    Function::new(ctx.clone(), require)?.with_name("require")
}

/// The `__dirname` binding for a module.
///
/// This is the *final* path segment of the identity (trailing separators
/// ignored), not the parent directory. Hosts that expect the conventional
/// meaning must account for it.
pub(crate) fn dirname_of(identity: &str) -> &str {
    let trimmed = identity.trim_end_matches('/');
    if trimmed.is_empty() {
        return identity;
    }
    match trimmed.rsplit_once('/') {
        Some((_, last)) => last,
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::dirname_of;

    #[test]
    fn dirname_is_the_last_segment() {
        assert_eq!(dirname_of("/app/lib/math.js"), "math.js");
        assert_eq!(dirname_of("lib/math.js"), "math.js");
        assert_eq!(dirname_of("math.js"), "math.js");
    }

    #[test]
    fn dirname_ignores_trailing_separators() {
        assert_eq!(dirname_of("/app/lib/"), "lib");
        assert_eq!(dirname_of("/app/lib//"), "lib");
    }

    #[test]
    fn dirname_of_root_and_builtins() {
        assert_eq!(dirname_of("/"), "/");
        assert_eq!(dirname_of(""), "");
        assert_eq!(dirname_of("console"), "console");
    }
}
