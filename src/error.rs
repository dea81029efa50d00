use std::io;
use std::path::PathBuf;

/// Everything that can go wrong during a test run.
///
/// Sampling over an empty tree is not an error (it yields an absent result);
/// these variants cover the external calls: directory listing, image decode,
/// model load, inference and viewer launch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to list directory {path}: {source}")]
    ListDir { path: PathBuf, source: io::Error },

    #[error("failed to read image {path}: {source}")]
    ReadImage { path: PathBuf, source: io::Error },

    #[error("failed to decode image {path}: {source}")]
    DecodeImage {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to load classifier from {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("inference failed: {message}")]
    Inference { message: String },

    #[error("failed to launch image viewer for {path}: {source}")]
    Viewer { path: PathBuf, source: io::Error },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl Error {
    pub(crate) fn list_dir(path: &std::path::Path, source: io::Error) -> Self {
        Self::ListDir {
            path: path.to_path_buf(),
            source,
        }
    }
}
