//! Routing of filesystem changes onto incremental site operations.
//!
//! The watcher reports debounced [`Change`]s; the dispatcher classifies each
//! path against the site's directory layout and applies the narrowest
//! operation that brings the output tree back in sync:
//!
//! | Source               | Reaction                              |
//! |----------------------|---------------------------------------|
//! | template directory   | reload templates, re-render all pages |
//! | stylesheet source    | recompile stylesheets only            |
//! | content `.md`/`.html`| update page table, re-render all pages|
//! | other content file   | copy or delete that one output file   |
//! | anything else        | ignored                               |
//!
//! Pages force a full re-render because any page can reach any other
//! through the collection and page globals.

use crate::error::Result;
use crate::render::sass;
use crate::site::{self, Site};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// What the watcher observed happening to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// One debounced filesystem change.
#[derive(Debug, Clone)]
pub struct Change {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Template,
    Stylesheet,
    Page,
    Asset,
    Ignored,
}

/// Owns the site between builds and maps changes onto it.
pub struct Dispatcher {
    site: Site,

    // Directory layout, canonicalized once so watcher paths (which arrive
    // absolute) compare against it directly.
    template_dir: PathBuf,
    content_dir: PathBuf,
    sass_in: Option<PathBuf>,
}

impl Dispatcher {
    /// Wrap an initialized site. The directory layout is snapshotted here;
    /// settings changes require a restart.
    pub fn new(site: Site) -> Self {
        let template_dir = normalize(&site.settings.template_dir());
        let content_dir = normalize(&site.settings.content_dir());
        let sass_in = site.settings.sass_in().map(|p| normalize(&p));
        Self {
            site,
            template_dir,
            content_dir,
            sass_in,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Apply one change. Errors bubble to the caller, which logs them and
    /// keeps watching.
    pub fn dispatch(&mut self, change: &Change) -> Result<()> {
        let path = normalize(&change.path);
        match self.classify(&path) {
            Route::Template => {
                self.site.reload_templates()?;
                self.site.render_all_pages()
            }
            Route::Stylesheet => self.site.compile_stylesheets(),
            Route::Page => {
                self.apply_page_change(&path, change.kind)?;
                self.site.render_all_pages()
            }
            Route::Asset => {
                // Canonical path back to a content-relative one.
                let rel = path.strip_prefix(&self.content_dir).unwrap_or(&path);
                match change.kind {
                    ChangeKind::Deleted => self.site.delete_file(rel),
                    ChangeKind::Added | ChangeKind::Modified => self.site.copy_file(rel),
                }
            }
            Route::Ignored => Ok(()),
        }
    }

    /// Update the page table for a content page change. A modification is a
    /// remove-then-add so renamed metadata (collections, template) never
    /// leaves stale state behind; the remove half tolerates pages the table
    /// never saw, which editors that replace files can produce.
    fn apply_page_change(&mut self, path: &Path, kind: ChangeKind) -> Result<()> {
        let name = site::page_name(path, &self.content_dir)?;
        let site_path = self.site.settings.content_dir().join(
            path.strip_prefix(&self.content_dir).unwrap_or(path),
        );
        match kind {
            ChangeKind::Added => self.site.add_page_from_file(&site_path),
            ChangeKind::Modified => {
                if self.site.pages.contains_key(&name) {
                    self.site.remove_page(&name)?;
                }
                self.site.add_page_from_file(&site_path)
            }
            ChangeKind::Deleted => self.site.remove_page(&name),
        }
    }

    fn classify(&self, path: &Path) -> Route {
        if is_hidden(path) {
            return Route::Ignored;
        }
        if path.starts_with(&self.template_dir) {
            return Route::Template;
        }
        if let Some(sass_in) = &self.sass_in {
            // Checked before content: the sass tree may nest inside it.
            if path.starts_with(sass_in) && sass::is_sass_source(path) {
                return Route::Stylesheet;
            }
        }
        if path.starts_with(&self.content_dir) {
            return match path.extension().and_then(|e| e.to_str()) {
                Some("md" | "html") => Route::Page,
                _ => Route::Asset,
            };
        }
        Route::Ignored
    }
}

/// Canonicalize where possible. Deleted files no longer resolve, so fall
/// back to canonicalizing the parent and re-attaching the file name.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteSettings;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Dispatcher) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("site");
        fs::create_dir_all(input.join("templates")).unwrap();
        fs::create_dir_all(input.join("content")).unwrap();
        fs::create_dir_all(input.join("sass")).unwrap();
        fs::write(
            input.join("templates/default.html"),
            "<body>{{ content | safe }}</body>",
        )
        .unwrap();
        fs::write(input.join("content/a.md"), "# A").unwrap();

        let toml = format!(
            "input_dir = {:?}\noutput_dir = {:?}\n[sass]\n",
            input.to_str().unwrap(),
            dir.path().join("dist").to_str().unwrap(),
        );
        let settings = SiteSettings::from_str(&toml).unwrap();
        let mut site = Site::from_settings(settings);
        site.initialize().unwrap();
        site.build().unwrap();
        (dir, Dispatcher::new(site))
    }

    fn change(path: PathBuf, kind: ChangeKind) -> Change {
        Change { path, kind }
    }

    #[test]
    fn test_added_page_renders() {
        let (dir, mut dispatcher) = fixture();
        let path = dir.path().join("site/content/b.md");
        fs::write(&path, "# B").unwrap();

        dispatcher.dispatch(&change(path, ChangeKind::Added)).unwrap();
        assert!(dispatcher.site().pages.contains_key("b"));
        assert!(dir.path().join("dist/b.html").exists());
    }

    #[test]
    fn test_modified_page_rerenders() {
        let (dir, mut dispatcher) = fixture();
        let path = dir.path().join("site/content/a.md");
        fs::write(&path, "# Changed").unwrap();

        dispatcher
            .dispatch(&change(path, ChangeKind::Modified))
            .unwrap();
        let html = fs::read_to_string(dir.path().join("dist/a.html")).unwrap();
        assert!(html.contains("Changed"));
    }

    #[test]
    fn test_modified_page_updates_collections() {
        let (dir, mut dispatcher) = fixture();
        let path = dir.path().join("site/content/a.md");
        fs::write(&path, "---\ncollections: [news]\n---\n# A").unwrap();
        dispatcher
            .dispatch(&change(path.clone(), ChangeKind::Modified))
            .unwrap();
        assert!(dispatcher.site().collections["news"].contains("a"));

        // Dropping the metadata drops the membership.
        fs::write(&path, "# A").unwrap();
        dispatcher
            .dispatch(&change(path, ChangeKind::Modified))
            .unwrap();
        assert!(!dispatcher.site().collections["news"].contains("a"));
    }

    #[test]
    fn test_deleted_page_removes_state_and_output() {
        let (dir, mut dispatcher) = fixture();
        let path = dir.path().join("site/content/a.md");
        fs::remove_file(&path).unwrap();

        dispatcher
            .dispatch(&change(path, ChangeKind::Deleted))
            .unwrap();
        assert!(dispatcher.site().pages.is_empty());
        assert!(!dir.path().join("dist/a.html").exists());
    }

    #[test]
    fn test_template_change_rerenders_all() {
        let (dir, mut dispatcher) = fixture();
        let path = dir.path().join("site/templates/default.html");
        fs::write(&path, "<main>{{ content | safe }}</main>").unwrap();

        dispatcher
            .dispatch(&change(path, ChangeKind::Modified))
            .unwrap();
        let html = fs::read_to_string(dir.path().join("dist/a.html")).unwrap();
        assert!(html.starts_with("<main>"));
    }

    #[test]
    fn test_stylesheet_change_compiles_only() {
        let (dir, mut dispatcher) = fixture();
        let path = dir.path().join("site/sass/main.scss");
        fs::write(&path, "a { color: blue; }").unwrap();

        // Break the rendered output to prove no page re-render happens.
        fs::write(dir.path().join("dist/a.html"), "sentinel").unwrap();
        dispatcher.dispatch(&change(path, ChangeKind::Added)).unwrap();

        assert!(dir.path().join("dist/css/main.css").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("dist/a.html")).unwrap(),
            "sentinel"
        );
    }

    #[test]
    fn test_asset_copy_and_delete() {
        let (dir, mut dispatcher) = fixture();
        let path = dir.path().join("site/content/notes.txt");
        fs::write(&path, "plain").unwrap();

        dispatcher
            .dispatch(&change(path.clone(), ChangeKind::Added))
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("dist/notes.txt")).unwrap(),
            "plain"
        );

        fs::remove_file(&path).unwrap();
        dispatcher
            .dispatch(&change(path, ChangeKind::Deleted))
            .unwrap();
        assert!(!dir.path().join("dist/notes.txt").exists());
    }

    #[test]
    fn test_unrelated_and_hidden_paths_ignored() {
        let (dir, mut dispatcher) = fixture();
        let before = dispatcher.site().pages.len();

        let outside = dir.path().join("elsewhere.md");
        fs::write(&outside, "# Out").unwrap();
        dispatcher
            .dispatch(&change(outside, ChangeKind::Added))
            .unwrap();

        let hidden = dir.path().join("site/content/.swap.md");
        fs::write(&hidden, "# Hidden").unwrap();
        dispatcher
            .dispatch(&change(hidden, ChangeKind::Added))
            .unwrap();

        assert_eq!(dispatcher.site().pages.len(), before);
    }

    #[test]
    fn test_classification() {
        let (dir, dispatcher) = fixture();
        let site = dir.path().join("site");
        let classify = |p: &Path| dispatcher.classify(&normalize(p));

        assert_eq!(classify(&site.join("templates/base.html")), Route::Template);
        assert_eq!(classify(&site.join("sass/x.scss")), Route::Stylesheet);
        assert_eq!(classify(&site.join("sass/readme.txt")), Route::Ignored);
        assert_eq!(classify(&site.join("content/x.md")), Route::Page);
        assert_eq!(classify(&site.join("content/x.html")), Route::Page);
        assert_eq!(classify(&site.join("content/x.png")), Route::Asset);
        assert_eq!(classify(&site.join("content/.x.md")), Route::Ignored);
        assert_eq!(classify(Path::new("/tmp")), Route::Ignored);
    }
}
