use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, RgbaImage, imageops::FilterType};
use ndarray::{Array4, CowArray};
use once_cell::sync::Lazy;
use ort::{
    GraphOptimizationLevel, SessionBuilder, environment::Environment, session::Session,
    tensor::OrtOwnedTensor, value::Value,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Label shown before any image has been picked.
pub const PLACEHOLDER_LABEL: &str = "Upload an image to predict";
/// Label shown when the model cannot be loaded.
pub const MODEL_LOAD_FAILED_LABEL: &str = "Failed to load model";
/// Label shown when inference fails or ranks nothing.
pub const CLASSIFY_FAILED_LABEL: &str = "Could not classify image";

/// One ranked class from the model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Softmax probability in [0,1].
    pub confidence: f32,
}

/// Something that turns a bitmap into a ranked class list.
pub trait ImageClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Prediction>>;
}

/// Loads a classifier on demand. One load per classification request;
/// a failed load means no inference is attempted for that request.
pub trait ClassifierProvider {
    type Classifier: ImageClassifier;

    fn load(&self) -> Result<Self::Classifier>;
}

/// Run one best-effort classification and reduce the outcome to the
/// display string contract: top result, or one of the fixed failure
/// labels. Never panics, never retries.
pub fn classify_to_label<P: ClassifierProvider>(provider: &P, image: &DynamicImage) -> String {
    let classifier = match provider.load() {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!("model load failed: {err:#}");
            return MODEL_LOAD_FAILED_LABEL.to_string();
        }
    };
    match classifier.classify(image) {
        Ok(ranked) => match ranked.first() {
            Some(top) => format!("It's a {}!", capitalize_words(&top.label)),
            None => CLASSIFY_FAILED_LABEL.to_string(),
        },
        Err(err) => {
            tracing::warn!("inference failed: {err:#}");
            CLASSIFY_FAILED_LABEL.to_string()
        }
    }
}

/// Uppercase the first letter of each whitespace-separated word and
/// lowercase the rest, so "tabby cat" renders as "Tabby Cat".
pub fn capitalize_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

static ORT_ENV: Lazy<Arc<Environment>> = Lazy::new(|| {
    Environment::builder()
        .with_name("animal-classifier")
        .build()
        .expect("failed to initialize ONNX Runtime environment")
        .into_arc()
});

/// Configuration for the ONNX-based pet classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/pet_classifier.onnx"),
            labels_path: PathBuf::from("models/labels.txt"),
            input_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

impl ClassifierProvider for ClassifierConfig {
    type Classifier = OnnxClassifier;

    fn load(&self) -> Result<OnnxClassifier> {
        OnnxClassifier::new(self)
    }
}

/// Pet classifier backed by ONNX Runtime.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Session,
    labels: Vec<String>,
    input_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl OnnxClassifier {
    pub fn new(cfg: &ClassifierConfig) -> Result<Self> {
        if !cfg.model_path.exists() {
            anyhow::bail!("model file missing: {}", cfg.model_path.to_string_lossy());
        }
        if !cfg.labels_path.exists() {
            anyhow::bail!("labels file missing: {}", cfg.labels_path.to_string_lossy());
        }
        let env = ORT_ENV.clone();
        let session = SessionBuilder::new(&env)?
            .with_optimization_level(GraphOptimizationLevel::Level1)?
            .with_model_from_file(&cfg.model_path)?;

        let labels_raw = fs::read_to_string(&cfg.labels_path).context("labels not readable")?;
        let labels = parse_labels(&labels_raw)?;

        Ok(Self {
            session,
            labels,
            input_size: cfg.input_size,
            mean: cfg.mean,
            std: cfg.std,
        })
    }

    fn prepare_input(&self, image: &DynamicImage) -> Array4<f32> {
        let resized = resize_to_square(image, self.input_size);
        let mut array =
            Array4::<f32>::zeros((1, 3, self.input_size as usize, self.input_size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let [r, g, b, _] = pixel.0;
            let coords = (y as usize, x as usize);
            array[[0, 0, coords.0, coords.1]] = normalize_channel(r, self.mean[0], self.std[0]);
            array[[0, 1, coords.0, coords.1]] = normalize_channel(g, self.mean[1], self.std[1]);
            array[[0, 2, coords.0, coords.1]] = normalize_channel(b, self.mean[2], self.std[2]);
        }
        array
    }
}

impl ImageClassifier for OnnxClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Prediction>> {
        let input_array = self.prepare_input(image).into_dyn();
        let cow = CowArray::from(input_array.view());
        let input = Value::from_array(self.session.allocator(), &cow)
            .map_err(|e| anyhow!("could not build input tensor: {e}"))?;
        let outputs: Vec<Value> = self.session.run(vec![input])?;
        if outputs.is_empty() {
            anyhow::bail!("model produced no output");
        }
        let logits: OrtOwnedTensor<f32, _> = outputs[0].try_extract()?;
        let view = logits.view();
        let scores: Vec<f32> = view.iter().cloned().collect();
        if scores.is_empty() {
            anyhow::bail!("empty logits");
        }
        let probs = softmax(&scores);
        Ok(rank_predictions(&self.labels, &probs))
    }
}

fn parse_labels(raw: &str) -> Result<Vec<String>> {
    let mut labels: Vec<String> = raw
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect();
    if labels.is_empty() {
        anyhow::bail!("labels file contains no labels");
    }
    // ensure stable ordering
    labels.dedup();
    Ok(labels)
}

/// Pair class probabilities with their label names, sorted by
/// probability descending. A class beyond the labels list gets a
/// synthetic `class_{idx}` name.
fn rank_predictions(labels: &[String], probs: &[f32]) -> Vec<Prediction> {
    let mut ranked: Vec<Prediction> = probs
        .iter()
        .enumerate()
        .map(|(idx, &p)| Prediction {
            label: labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{idx}")),
            confidence: p,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

fn resize_to_square(img: &DynamicImage, size: u32) -> RgbaImage {
    img.resize_exact(size, size, FilterType::Triangle).to_rgba8()
}

fn normalize_channel(value: u8, mean: f32, std: f32) -> f32 {
    let v = value as f32 / 255.0;
    (v - mean) / std
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|x| x / sum).collect()
}
