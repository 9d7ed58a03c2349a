//! Inference decision pipeline: preprocess, forward pass, abstention rule.

mod decision;
mod preprocess;

pub use decision::{Decision, decide};
pub use preprocess::preprocess;

use crate::config::ClassifierConfig;
use crate::model::{InferenceError, ScoreModel};
use image::DynamicImage;
use ndarray::Array4;
use std::sync::Arc;
use std::time::Instant;

/// The classifier as seen by the presentation shells. Cheap to clone; the
/// model is shared.
#[derive(Clone)]
pub struct Pipeline {
    model: Arc<dyn ScoreModel>,
    config: ClassifierConfig,
}

impl Pipeline {
    pub fn new(model: Arc<dyn ScoreModel>, config: ClassifierConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn model(&self) -> &dyn ScoreModel {
        self.model.as_ref()
    }

    pub fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        preprocess(image, self.config.width(), self.config.height())
    }

    /// Runs the forward pass and checks one score came back per class.
    pub fn infer(&self, batch: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let scores = self.model.predict(batch)?;
        if scores.len() != self.config.class_names.len() {
            return Err(InferenceError::ScoreShape {
                expected: self.config.class_names.len(),
                actual: scores.len(),
            });
        }
        Ok(scores)
    }

    pub fn decide(&self, scores: &[f32]) -> Decision {
        decide(scores, &self.config)
    }

    pub fn classify(&self, image: &DynamicImage) -> Result<Decision, InferenceError> {
        let start = Instant::now();
        let batch = self.preprocess(image);
        let scores = self.infer(&batch)?;
        let decision = self.decide(&scores);
        log::debug!(
            "Scores {:?} -> {} in {:.1}ms",
            scores,
            decision,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(decision)
    }
}
