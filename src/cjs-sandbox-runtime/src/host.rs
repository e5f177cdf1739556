use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;

/// A trait representing the host environment for the module loader.
///
/// These two capabilities are the entire boundary between the loader and the
/// outside world: the loader never touches a filesystem or bundle itself.
pub trait Host {
    /// Resolve a module specifier to its canonical identity (usually a path).
    ///
    /// `base` is the identity of the module issuing the request, or `None` for
    /// a top-level request made by the embedder.
    fn resolve_module(&self, base: Option<String>, name: String) -> Result<String>;

    /// Obtain the source text of a module given its canonical identity.
    fn load_module(&self, identity: String) -> Result<String>;
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn resolve_module(&self, base: Option<String>, name: String) -> Result<String> {
        (**self).resolve_module(base, name)
    }

    fn load_module(&self, identity: String) -> Result<String> {
        (**self).load_module(identity)
    }
}

impl<H: Host + ?Sized> Host for Arc<H> {
    fn resolve_module(&self, base: Option<String>, name: String) -> Result<String> {
        (**self).resolve_module(base, name)
    }

    fn load_module(&self, identity: String) -> Result<String> {
        (**self).load_module(identity)
    }
}
