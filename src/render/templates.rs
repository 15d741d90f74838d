//! Tera template environment bound to a site's template directory.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// Template environment wrapper. Holds the directory it was loaded from so
/// the dispatcher can rebuild it when templates change on disk.
#[derive(Debug)]
pub struct TemplateEnv {
    tera: Tera,
    dir: PathBuf,
}

impl TemplateEnv {
    /// Load every template under `dir` (recursively).
    pub fn load(dir: &Path) -> Result<Self> {
        let glob = format!("{}/**/*", dir.display());
        let tera = Tera::new(&glob)?;
        Ok(Self {
            tera,
            dir: dir.to_path_buf(),
        })
    }

    /// Re-read all templates from disk.
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::load(&self.dir.clone())?;
        Ok(())
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(name, context)?)
    }

    /// Render raw text as a one-off template fragment. Used for pages whose
    /// content embeds template directives.
    pub fn render_str(&mut self, raw: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render_str(raw, context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn env_with(templates: &[(&str, &str)]) -> (tempfile::TempDir, TemplateEnv) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in templates {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let env = TemplateEnv::load(dir.path()).unwrap();
        (dir, env)
    }

    #[test]
    fn test_render_named_template() {
        let (_dir, env) = env_with(&[("default.html", "<h1>{{ title }}</h1>")]);
        let mut context = Context::new();
        context.insert("title", "Hello");
        assert_eq!(
            env.render("default.html", &context).unwrap(),
            "<h1>Hello</h1>"
        );
    }

    #[test]
    fn test_render_str_fragment() {
        let (_dir, mut env) = env_with(&[]);
        let mut context = Context::new();
        context.insert("name", "world");
        assert_eq!(
            env.render_str("hello {{ name }}", &context).unwrap(),
            "hello world"
        );
    }

    #[test]
    fn test_missing_template_errors() {
        let (_dir, env) = env_with(&[]);
        assert!(env.render("nope.html", &Context::new()).is_err());
    }
}
