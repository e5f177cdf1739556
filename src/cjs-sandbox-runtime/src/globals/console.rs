use rquickjs::Ctx;
use rquickjs::object::Property;

use crate::loader::require;

pub fn setup(ctx: &Ctx<'_>) -> anyhow::Result<()> {
    let globals = ctx.globals();

    // Setup `console`, the same object `require('console')` returns.
    let console = require(ctx, "console")?;
    globals.prop("console", Property::from(console))?;

    Ok(())
}
