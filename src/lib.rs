pub mod config;
pub mod error;
pub mod model;
pub mod sampler;
pub mod viewer;

use burn::{
    config::Config,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::{activation::softmax, Tensor},
};
use burn_ndarray::NdArray;
use image::ImageReader;
use rand::Rng;
use std::io::Write;
use std::path::{Path, PathBuf};

use config::AppConfig;
use error::Error;
use model::{Model, ModelRecord, CHANNELS, IMG_SIZE};
use viewer::ImageOpener;

// NdArray backend for CPU inference
type Backend = NdArray;

/// Top-1 output for one input image.
#[derive(Clone, Debug, PartialEq)]
pub struct TopPrediction {
    pub class_index: usize,
    /// Softmax probability of the predicted class, in [0, 1].
    pub confidence: f32,
}

/// A classifier producing one top-1 prediction per input image.
///
/// The trait is the seam between orchestration and the trained model, so
/// tests can substitute a stub without touching any model artifact.
pub trait Classify {
    /// Ordered class labels; `TopPrediction::class_index` indexes into this.
    fn names(&self) -> &[String];

    fn predict(&self, images: &[PathBuf]) -> Result<Vec<TopPrediction>, Error>;
}

/// Sidecar metadata stored next to the model record at training time.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// Class labels in model output order.
    pub labels: Vec<String>,
}

/// Pre-trained CNN classifier loaded from a weights directory.
///
/// Expects `config.json` (labels) and `best.mpk` (model record) inside the
/// directory, as written by the training run.
pub struct ImageClassifier {
    model: Model<Backend>,
    labels: Vec<String>,
    device: <Backend as burn::tensor::backend::Backend>::Device,
}

impl ImageClassifier {
    /// Loads the model exactly once; reuse the instance for further calls.
    pub fn load(weights_dir: &Path) -> Result<Self, Error> {
        let device = Default::default();

        let config_path = weights_dir.join("config.json");
        let config = ClassifierConfig::load(&config_path).map_err(|e| Error::ModelLoad {
            path: config_path,
            message: e.to_string(),
        })?;

        let record_path = weights_dir.join("best");
        let record: ModelRecord<Backend> = CompactRecorder::new()
            .load(record_path.clone(), &device)
            .map_err(|e| Error::ModelLoad {
                path: record_path,
                message: e.to_string(),
            })?;

        let model = Model::new(config.labels.len(), &device).load_record(record);

        Ok(Self {
            model,
            labels: config.labels,
            device,
        })
    }

    /// Decodes and resizes one image into a normalized [C, H, W] tensor.
    fn image_to_tensor(&self, path: &Path) -> Result<Tensor<Backend, 3>, Error> {
        let img = ImageReader::open(path)
            .map_err(|source| Error::ReadImage {
                path: path.to_path_buf(),
                source,
            })?
            .with_guessed_format()
            .map_err(|source| Error::ReadImage {
                path: path.to_path_buf(),
                source,
            })?
            .decode()
            .map_err(|source| Error::DecodeImage {
                path: path.to_path_buf(),
                source,
            })?;

        // Triangle filter matches training preprocessing
        let rgb = img
            .resize_exact(
                IMG_SIZE as u32,
                IMG_SIZE as u32,
                image::imageops::FilterType::Triangle,
            )
            .to_rgb8();

        // HWC -> CHW, pixels normalized to [-1.0, 1.0]
        let mut pixels = Vec::with_capacity(CHANNELS * IMG_SIZE * IMG_SIZE);
        for channel in 0..CHANNELS {
            for pixel in rgb.pixels() {
                let val = pixel.0[channel] as f32 / 255.0;
                pixels.push((val - 0.5) / 0.5);
            }
        }

        Ok(Tensor::<Backend, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([CHANNELS, IMG_SIZE, IMG_SIZE]))
    }
}

impl Classify for ImageClassifier {
    fn names(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, images: &[PathBuf]) -> Result<Vec<TopPrediction>, Error> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = Vec::with_capacity(images.len());
        for path in images {
            batch.push(self.image_to_tensor(path)?);
        }
        let input: Tensor<Backend, 4> = Tensor::stack(batch, 0);

        let probs = softmax(self.model.forward(input), 1);
        let (scores, indices) = probs.max_dim_with_indices(1);

        let scores: Vec<f32> = scores
            .into_data()
            .to_vec()
            .map_err(|e| Error::Inference {
                message: format!("{e:?}"),
            })?;
        let indices: Vec<i64> = indices
            .into_data()
            .to_vec()
            .map_err(|e| Error::Inference {
                message: format!("{e:?}"),
            })?;

        Ok(indices
            .into_iter()
            .zip(scores)
            .map(|(idx, confidence)| TopPrediction {
                class_index: idx as usize,
                confidence,
            })
            .collect())
    }
}

/// One full test run: sample a random validation image, open it in the
/// system viewer, classify it, and report the top-1 label and confidence.
///
/// When sampling finds nothing the classifier is never invoked.
pub fn run<C, O, R, W>(
    config: &AppConfig,
    classifier: &C,
    opener: &O,
    rng: &mut R,
    out: &mut W,
) -> Result<(), Error>
where
    C: Classify,
    O: ImageOpener + ?Sized,
    R: Rng + ?Sized,
    W: Write,
{
    let Some(path) = sampler::sample_image(&config.val_dir, config.image_extensions, rng)? else {
        writeln!(out, "no image found")?;
        return Ok(());
    };

    writeln!(out, "testing image: {}", path.display())?;

    // Viewing is a convenience step; a broken viewer should not stop the test.
    if let Err(e) = opener.open(&path) {
        log::warn!("could not open image viewer, continuing: {e}");
    }

    let results = classifier.predict(std::slice::from_ref(&path))?;
    if let Some(top) = results.first() {
        let label = classifier
            .names()
            .get(top.class_index)
            .map(String::as_str)
            .unwrap_or("unknown");
        writeln!(
            out,
            "prediction result: {} (confidence: {:.2})",
            label, top.confidence
        )?;
    }

    Ok(())
}
