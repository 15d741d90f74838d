//! Sass/SCSS tree compilation into the css output directory.

use crate::error::{Result, SiltError};
use grass::{Options, OutputStyle};
use std::{fs, path::Path};
use walkdir::WalkDir;

/// Compile every non-partial `.sass`/`.scss` file under `sass_in` into
/// `sass_out`, preserving relative paths with a `.css` extension.
///
/// `output_style` is one of the validated settings values; grass only
/// distinguishes expanded and compressed output, so `nested` and `compact`
/// collapse to expanded.
pub fn compile_tree(sass_in: &Path, sass_out: &Path, output_style: &str) -> Result<()> {
    let style = match output_style {
        "compressed" => OutputStyle::Compressed,
        _ => OutputStyle::Expanded,
    };
    let options = Options::default().style(style).load_path(sass_in);

    for entry in WalkDir::new(sass_in) {
        let entry = entry.map_err(|err| {
            SiltError::Io(sass_in.to_path_buf(), err.into())
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_sass_source(path) || is_partial(path) {
            continue;
        }

        let css = grass::from_path(path, &options)
            .map_err(|err| SiltError::Sass(err.to_string()))?;

        let rel = path
            .strip_prefix(sass_in)
            .unwrap_or(path)
            .with_extension("css");
        let dest = sass_out.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| SiltError::Io(parent.to_path_buf(), err))?;
        }
        fs::write(&dest, css).map_err(|err| SiltError::Io(dest.clone(), err))?;
    }

    Ok(())
}

/// True for `.sass`/`.scss` files.
pub fn is_sass_source(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("sass" | "scss")
    )
}

/// Partials (leading underscore) are imported, never compiled standalone.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
