mod markdown;
mod output;
pub mod pipeline;
mod render;
mod sanitize;

pub use markdown::{MarkdownError, markdown_options};
pub use output::{OutputError, OutputFile, OutputTarget, write_output};
pub use pipeline::{Pipeline, SourceDocument};
pub use render::RenderError;

/// Errors from assembling the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("{0}")]
    Markdown(#[from] MarkdownError),

    #[error("{0}")]
    Render(#[from] RenderError),
}
