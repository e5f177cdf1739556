//! A small subset of the `path` module, for `/`-separated paths.

use rquickjs::prelude::Rest;
use rquickjs::{Ctx, Function, Object, Result};

fn basename(path: String) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((_, last)) => last.to_string(),
        None => trimmed.to_string(),
    }
}

fn dirname(path: String) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with('/') { "/" } else { "." }.to_string();
    }
    match trimmed.rsplit_once('/') {
        Some(("", _)) => "/".to_string(),
        Some((parent, _)) => parent.trim_end_matches('/').to_string(),
        None => ".".to_string(),
    }
}

fn extname(path: String) -> String {
    let base = basename(path);
    match base.rfind('.') {
        Some(0) | None => String::new(),
        Some(dot) => base[dot..].to_string(),
    }
}

fn join(parts: Rest<String>) -> String {
    let parts = parts.into_inner();
    let absolute = parts
        .iter()
        .find(|part| !part.is_empty())
        .is_some_and(|part| part.starts_with('/'));

    let mut segments: Vec<&str> = Vec::new();
    for segment in parts.iter().flat_map(|part| part.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            segment => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

pub fn init<'js>(ctx: &Ctx<'js>, exports: &Object<'js>) -> Result<()> {
    exports.set("basename", Function::new(ctx.clone(), basename)?.with_name("basename")?)?;
    exports.set("dirname", Function::new(ctx.clone(), dirname)?.with_name("dirname")?)?;
    exports.set("extname", Function::new(ctx.clone(), extname)?.with_name("extname")?)?;
    exports.set("join", Function::new(ctx.clone(), join)?.with_name("join")?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rquickjs::prelude::Rest;

    use super::*;

    fn join_all(parts: &[&str]) -> String {
        join(Rest(parts.iter().map(|p| p.to_string()).collect()))
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/a/b/c.js".into()), "c.js");
        assert_eq!(basename("/a/b/".into()), "b");
        assert_eq!(basename("c.js".into()), "c.js");
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("/a/b/c.js".into()), "/a/b");
        assert_eq!(dirname("/c.js".into()), "/");
        assert_eq!(dirname("c.js".into()), ".");
        assert_eq!(dirname("/".into()), "/");
        assert_eq!(dirname("a/b/".into()), "a");
    }

    #[test]
    fn test_extname() {
        assert_eq!(extname("/a/b/c.test.js".into()), ".js");
        assert_eq!(extname("/a/.hidden".into()), "");
        assert_eq!(extname("/a/noext".into()), "");
    }

    #[test]
    fn test_join() {
        assert_eq!(join_all(&["/a", "b", "../c.js"]), "/a/c.js");
        assert_eq!(join_all(&["a", "./b/"]), "a/b");
        assert_eq!(join_all(&["..", "a"]), "../a");
        assert_eq!(join_all(&["/", ".."]), "/");
        assert_eq!(join_all(&[]), ".");
    }
}
