use rquickjs::Ctx;

mod console;

pub fn setup(ctx: &Ctx<'_>) -> anyhow::Result<()> {
    console::setup(ctx)?;
    Ok(())
}
