use std::io::Write as _;

use rquickjs::prelude::Rest;
use rquickjs::{Coerced, Ctx, Function, Object, Result};

fn format_line(args: Rest<Coerced<String>>) -> String {
    let mut line = args
        .into_inner()
        .into_iter()
        .map(|mut c| {
            c.0.push(' ');
            c.0
        })
        .collect::<String>();
    line.pop(); // remove the last space
    line.push('\n');
    line
}

fn log(args: Rest<Coerced<String>>) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(format_line(args).as_bytes());
    let _ = stdout.flush();
}

fn error(args: Rest<Coerced<String>>) {
    let mut stderr = std::io::stderr().lock();
    let _ = stderr.write_all(format_line(args).as_bytes());
}

pub fn init<'js>(ctx: &Ctx<'js>, exports: &Object<'js>) -> Result<()> {
    for name in ["log", "info", "debug"] {
        exports.set(name, Function::new(ctx.clone(), log)?.with_name(name)?)?;
    }
    for name in ["warn", "error"] {
        exports.set(name, Function::new(ctx.clone(), error)?.with_name(name)?)?;
    }
    Ok(())
}
