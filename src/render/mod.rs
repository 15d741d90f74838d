//! Rendering collaborators: template environment, Markdown converter,
//! stylesheet compiler.

pub mod markdown;
pub mod sass;
pub mod templates;
