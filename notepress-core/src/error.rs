//! Errors raised by the export pipeline.

use crate::frontmatter::FrontmatterError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Missing source directory {0:?} (did you init submodules?)")]
    SourceMissing(PathBuf),

    #[error("Source path {0:?} is not a directory")]
    SourceNotDirectory(PathBuf),

    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output path {path:?} is claimed by both {first} and {second}")]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Output path {0:?} escapes the output directory")]
    OutputOutsideRoot(PathBuf),

    #[error("Output directory {output:?} would overwrite source directory {source_dir:?}")]
    OutputOverlapsSource { output: PathBuf, source_dir: PathBuf },

    #[error("Failed to render front matter: {0}")]
    Render(#[from] FrontmatterError),
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
