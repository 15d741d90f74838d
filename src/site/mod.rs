//! The site model: the page table, the collection table, and the
//! build-lifecycle operations over them.
//!
//! # Lifecycle
//!
//! ```text
//! Constructed ──initialize()──▶ Initialized ──▶ build / render / copy / compile
//!      │                            ▲
//!      └── clean() valid here ──────┘ (initialize is idempotent)
//! ```
//!
//! `initialize()` builds the configured collections, loads the template
//! environment, and scans the content tree, classifying every entry into
//! {markdown page, html page, stylesheet source (excluded), opaque file
//! (copy list)}. Build-family operations fail with `NotInitialized` before
//! that.

pub mod collection;
pub mod page;

use crate::config::SiteSettings;
use crate::error::{Result, SiltError};
use crate::render::markdown::MarkdownRenderer;
use crate::render::sass;
use crate::render::templates::TemplateEnv;
use collection::Collection;
use page::{ContentFormat, Page, PageTable};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value, json};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Owns all pages and collections for one build, plus the render
/// configuration and the list of files slated for verbatim copy.
pub struct Site {
    pub settings: SiteSettings,
    pub ctx: Map<String, Value>,
    pub pages: PageTable,
    pub collections: FxHashMap<String, Collection>,

    /// Content-relative paths of non-page files, populated by the scan.
    files_to_copy: Vec<PathBuf>,

    /// `Some` once initialized; doubles as the lifecycle marker.
    templates: Option<TemplateEnv>,

    /// Site-default Markdown renderer. Pages carrying overrides get a
    /// fresh renderer at render time.
    markdown: MarkdownRenderer,
}

impl Site {
    /// Bind validated settings; nothing is scanned yet.
    pub fn from_settings(settings: SiteSettings) -> Self {
        let ctx = settings.ctx.clone();
        let markdown = MarkdownRenderer::new(settings.markdown.clone());
        Self {
            settings,
            ctx,
            pages: PageTable::default(),
            collections: FxHashMap::default(),
            files_to_copy: Vec::new(),
            templates: None,
            markdown,
        }
    }

    /// Load settings from a file and construct a site; scans the content
    /// tree unless `fully_initialize` is false (a `clean` never needs the
    /// template environment).
    pub fn from_settings_file(
        path: &Path,
        output_dir: Option<&Path>,
        fully_initialize: bool,
    ) -> Result<Self> {
        let settings = SiteSettings::from_path(path, output_dir)?;
        let mut site = Self::from_settings(settings);
        if fully_initialize {
            site.initialize()?;
        }
        Ok(site)
    }

    pub fn is_initialized(&self) -> bool {
        self.templates.is_some()
    }

    /// Transition to `Initialized`: build configured collections, load the
    /// template environment, scan the content tree. Repeated calls no-op.
    pub fn initialize(&mut self) -> Result<()> {
        if self.templates.is_some() {
            return Ok(());
        }

        for (name, spec) in &self.settings.collections {
            self.collections
                .insert(name.clone(), Collection::from_settings(name, spec));
        }

        self.scan_content_tree()?;

        // Feeds resolve against the post-scan collection table, so they may
        // reference collections pages created implicitly.
        for feed in &self.settings.feeds {
            if !self.collections.contains_key(&feed.collection) {
                return Err(SiltError::CollectionNotFound(feed.collection.clone()));
            }
        }

        // Set last: the marker flips only on a fully successful pass.
        self.templates = Some(TemplateEnv::load(&self.settings.template_dir())?);
        Ok(())
    }

    /// Walk the content tree and classify every entry. Scan errors
    /// propagate and abort the scan: a partial content tree is unsafe to
    /// build from.
    fn scan_content_tree(&mut self) -> Result<()> {
        let content_dir = self.settings.content_dir();
        let walker = WalkDir::new(&content_dir)
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry =
                entry.map_err(|err| SiltError::Io(content_dir.clone(), err.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("md" | "html") => self.add_page_from_file(path)?,
                _ if self.is_sass_file(path) => {}
                _ => {
                    let rel = path
                        .strip_prefix(&content_dir)
                        .unwrap_or(path)
                        .to_path_buf();
                    self.files_to_copy.push(rel);
                }
            }
        }
        Ok(())
    }

    /// True when the sass pipeline is configured and `path` is a stylesheet
    /// source under its input directory.
    fn is_sass_file(&self, path: &Path) -> bool {
        match self.settings.sass_in() {
            Some(sass_in) => sass::is_sass_source(path) && path.starts_with(&sass_in),
            None => false,
        }
    }

    // ========================================================================
    // Page registration
    // ========================================================================

    /// Load and register one page from a content file. The page name is the
    /// path relative to the content root, extension stripped,
    /// forward-slash-normalized.
    pub fn add_page_from_file(&mut self, path: &Path) -> Result<()> {
        let content_dir = self.settings.content_dir();
        let name = page_name(path, &content_dir)?;

        let (content, metadata, format) = match path.extension().and_then(|e| e.to_str()) {
            Some("html") => {
                let content = fs::read_to_string(path)
                    .map_err(|err| SiltError::Io(path.to_path_buf(), err))?;
                (content, Map::new(), ContentFormat::Html)
            }
            _ => {
                let raw = fs::read_to_string(path)
                    .map_err(|err| SiltError::Io(path.to_path_buf(), err))?;
                let (content, metadata) = split_front_matter(&raw, path)?;
                (content, metadata, ContentFormat::Markdown)
            }
        };

        let page = Page::new(name, content, metadata, format)?;
        self.register_page(page)
    }

    /// Register a page into the page table and into every collection its
    /// metadata names, auto-creating unconfigured collections on demand.
    fn register_page(&mut self, page: Page) -> Result<()> {
        if self.pages.contains_key(&page.name) {
            return Err(SiltError::ContentCollision(page.name));
        }
        for name in &page.collections {
            self.collections
                .entry(name.clone())
                .or_insert_with(|| Collection::new(name.clone()))
                .append(&page);
        }
        self.pages.insert(page.name.clone(), page);
        Ok(())
    }

    /// Unregister a page from every collection it belongs to, drop its
    /// table entry, and delete its output file (missing output tolerated).
    pub fn remove_page(&mut self, name: &str) -> Result<()> {
        let page = self
            .pages
            .remove(name)
            .ok_or_else(|| SiltError::PageNotFound(name.to_string()))?;

        for collection_name in &page.collections {
            if let Some(collection) = self.collections.get_mut(collection_name) {
                collection.remove(&page.name)?;
            }
        }

        remove_if_exists(&self.output_path(&page.name))
    }

    /// Remove the page registered for a content file path.
    pub fn remove_page_from_file(&mut self, path: &Path) -> Result<()> {
        let name = page_name(path, &self.settings.content_dir())?;
        self.remove_page(&name)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render one page and write `output_dir/<name>.html`, creating parent
    /// directories as needed. The output is rendered fully in memory before
    /// any write.
    pub fn render_page(&mut self, name: &str) -> Result<()> {
        if self.templates.is_none() {
            return Err(SiltError::NotInitialized);
        }
        let page = self
            .pages
            .get(name)
            .cloned()
            .ok_or_else(|| SiltError::PageNotFound(name.to_string()))?;

        let mut context = self.render_context();
        context.insert("page", &page);

        let mut content = page.content.clone();
        if page.has_tera {
            // The page's raw content is itself a template fragment.
            content = self.templates_mut()?.render_str(&content, &context)?;
        }
        if page.content_format == ContentFormat::Markdown {
            content = match &page.markdown {
                Some(overrides) => {
                    MarkdownRenderer::with_overrides(&self.settings.markdown, overrides)?
                        .convert(&content)
                }
                None => self.markdown.convert(&content),
            };
        }
        context.insert("content", &content);

        let template = page
            .template
            .as_deref()
            .unwrap_or(&self.settings.default_template);
        let html = self.templates_ref()?.render(template, &context)?;

        let dest = self.output_path(&page.name);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| SiltError::Io(parent.to_path_buf(), err))?;
        }
        fs::write(&dest, html).map_err(|err| SiltError::Io(dest.clone(), err))
    }

    /// Render every registered page; order is unspecified. The first
    /// failure aborts the pass.
    pub fn render_all_pages(&mut self) -> Result<()> {
        if self.templates.is_none() {
            return Err(SiltError::NotInitialized);
        }
        let names: Vec<String> = self.pages.keys().cloned().collect();
        for name in names {
            self.render_page(&name)?;
        }
        Ok(())
    }

    /// Rebuild the template environment from disk.
    pub fn reload_templates(&mut self) -> Result<()> {
        self.templates_mut()?.reload()
    }

    /// Compile the stylesheet tree; silently a no-op when the sass pipeline
    /// is unconfigured.
    pub fn compile_stylesheets(&self) -> Result<()> {
        if self.templates.is_none() {
            return Err(SiltError::NotInitialized);
        }
        let (Some(sass_in), Some(sass_out)) = (self.settings.sass_in(), self.settings.sass_out())
        else {
            return Ok(());
        };
        let style = self
            .settings
            .sass
            .as_ref()
            .map(|s| s.output_style.as_str())
            .unwrap_or("nested");
        sass::compile_tree(&sass_in, &sass_out, style)
    }

    // ========================================================================
    // Verbatim copies
    // ========================================================================

    /// Copy one file from the content root to the output root at the same
    /// relative path.
    pub fn copy_file(&self, rel: &Path) -> Result<()> {
        let source = self.settings.content_dir().join(rel);
        let dest = self.settings.output_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| SiltError::Io(parent.to_path_buf(), err))?;
        }
        fs::copy(&source, &dest).map_err(|err| SiltError::Io(source.clone(), err))?;
        Ok(())
    }

    /// Copy everything the scan slated for verbatim copy.
    pub fn copy_all_files(&self) -> Result<()> {
        if self.templates.is_none() {
            return Err(SiltError::NotInitialized);
        }
        for rel in &self.files_to_copy {
            self.copy_file(rel)?;
        }
        Ok(())
    }

    /// Delete the copied output for a content-relative path; missing output
    /// is not an error.
    pub fn delete_file(&self, rel: &Path) -> Result<()> {
        remove_if_exists(&self.settings.output_dir.join(rel))
    }

    // ========================================================================
    // Build lifecycle
    // ========================================================================

    /// Full build: render all pages, compile stylesheets, copy files, in
    /// that order. Pages are excluded from the copy list during the scan,
    /// so render and copy write disjoint namespaces.
    pub fn build(&mut self) -> Result<()> {
        if self.templates.is_none() {
            return Err(SiltError::NotInitialized);
        }
        self.render_all_pages()?;
        self.compile_stylesheets()?;
        self.copy_all_files()
    }

    /// Delete all contents of the output directory, leaving the directory
    /// itself in place. Valid while merely `Constructed`.
    pub fn clean(&self) -> Result<()> {
        let output = &self.settings.output_dir;
        if !output.exists() {
            return Ok(());
        }
        let entries =
            fs::read_dir(output).map_err(|err| SiltError::Io(output.clone(), err))?;
        for entry in entries {
            let entry = entry.map_err(|err| SiltError::Io(output.clone(), err))?;
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            result.map_err(|err| SiltError::Io(path, err))?;
        }
        Ok(())
    }

    // ========================================================================
    // Render context
    // ========================================================================

    /// The global bindings exposed to every render: `site`, `collections`,
    /// `feeds`, `pages`. Rebuilt from current site state on each call, so
    /// mutations never leak through stale globals.
    fn render_context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert(
            "site",
            &json!({ "settings": self.settings, "ctx": self.ctx }),
        );

        let collections: Map<String, Value> = self
            .collections
            .iter()
            .map(|(name, collection)| {
                let view = json!({
                    "name": collection.name,
                    "pages": collection.pages(&self.pages),
                });
                (name.clone(), view)
            })
            .collect();
        context.insert("collections", &collections);
        context.insert("feeds", &self.settings.feeds);
        context.insert("pages", &self.pages);
        context
    }

    /// Output file for a page name: `output_dir/<name>.html`.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.settings.output_dir.join(format!("{name}.html"))
    }

    fn templates_ref(&self) -> Result<&TemplateEnv> {
        self.templates.as_ref().ok_or(SiltError::NotInitialized)
    }

    fn templates_mut(&mut self) -> Result<&mut TemplateEnv> {
        self.templates.as_mut().ok_or(SiltError::NotInitialized)
    }
}

/// Page name for a content file: relative path, extension stripped,
/// forward-slash-normalized.
pub fn page_name(path: &Path, content_dir: &Path) -> Result<String> {
    let rel = path.strip_prefix(content_dir).map_err(|_| {
        SiltError::Validation(format!(
            "`{}` is not under the content directory",
            path.display()
        ))
    })?;
    let rel = rel.with_extension("");
    let name = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Ok(name)
}

/// Split a `---` delimited YAML front-matter block off raw file content.
/// Files without a block yield empty metadata.
fn split_front_matter(raw: &str, path: &Path) -> Result<(String, Map<String, Value>)> {
    let mut lines = raw.lines();
    if lines.next().map(str::trim_end) != Some("---") {
        return Ok((raw.to_string(), Map::new()));
    }

    let mut yaml_lines = Vec::new();
    let mut closed = false;
    for line in &mut lines {
        if line.trim_end() == "---" {
            closed = true;
            break;
        }
        yaml_lines.push(line);
    }
    if !closed {
        // An unclosed delimiter is ordinary content, not front matter.
        return Ok((raw.to_string(), Map::new()));
    }

    let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml_lines.join("\n"))
        .map_err(|err| SiltError::FrontMatter(path.to_path_buf(), err))?;
    let metadata = match serde_json::to_value(parsed) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Map::new(),
        _ => {
            return Err(SiltError::Validation(format!(
                "front matter in `{}` must be a mapping",
                path.display()
            )));
        }
    };

    let content = lines.collect::<Vec<_>>().join("\n");
    Ok((content, metadata))
}

/// Hidden entries (dotfiles) are excluded from the scan.
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(SiltError::Io(path.to_path_buf(), err)),
    }
}
