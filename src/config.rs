use std::path::PathBuf;

/// File extensions that qualify a file as a candidate image.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Runtime configuration for a test run.
///
/// Passed explicitly into the sampler and classifier loader so tests can
/// point everything at temporary directories.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Validation root: one subdirectory per class label, images inside.
    pub val_dir: PathBuf,
    /// Directory holding the trained model record and its config.
    pub weights_dir: PathBuf,
    /// Accepted image extensions, matched case-insensitively.
    pub image_extensions: &'static [&'static str],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            val_dir: PathBuf::from("./val"),
            weights_dir: PathBuf::from("./runs/classify/train/weights"),
            image_extensions: &IMAGE_EXTENSIONS,
        }
    }
}
