use crate::config::ModelConfig;
use ndarray::Array4;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("Forward pass failed: {0}")]
    Forward(String),
    #[error("Model returned {actual} scores but {expected} class names are configured")]
    ScoreShape { expected: usize, actual: usize },
    #[error("No model backend compiled in; rebuild with `--features torch`")]
    BackendUnavailable,
}

#[cfg(feature = "torch")]
impl From<tch::TchError> for InferenceError {
    fn from(err: tch::TchError) -> Self {
        InferenceError::Forward(err.to_string())
    }
}

/// A loaded classifier: one batch in, one score per class out.
///
/// Implementations are loaded once and shared read-only for the process
/// lifetime, so they must be `Send + Sync`.
pub trait ScoreModel: Send + Sync {
    fn predict(&self, batch: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;

    /// Short human readable description for logs and the health endpoint.
    fn describe(&self) -> String;
}

/// Loads the model artifact named by `config`.
pub fn load_model(config: &ModelConfig) -> Result<Arc<dyn ScoreModel>, InferenceError> {
    #[cfg(feature = "torch")]
    {
        let model = torch::TorchModel::load(config)?;
        Ok(Arc::new(model))
    }

    #[cfg(not(feature = "torch"))]
    {
        log::error!(
            "Cannot load {}: built without a model backend, enable the `torch` feature \
             (cargo run --features torch) with libtorch installed",
            config.path.display()
        );
        Err(InferenceError::BackendUnavailable)
    }
}

#[cfg(feature = "torch")]
pub use torch::TorchModel;

#[cfg(feature = "torch")]
mod torch {
    use super::{InferenceError, ScoreModel};
    use crate::config::{InputLayout, ModelConfig};
    use ndarray::Array4;
    use std::sync::Mutex;
    use tch::{CModule, Device, Kind, Tensor};

    /// TorchScript module evaluated with libtorch.
    pub struct TorchModel {
        module: Mutex<CModule>,
        device: Device,
        layout: InputLayout,
        apply_softmax: bool,
        description: String,
    }

    impl TorchModel {
        pub fn load(config: &ModelConfig) -> Result<Self, InferenceError> {
            let device = Device::cuda_if_available();
            let path = config.path.display().to_string();
            log::info!("Loading TorchScript model {} on {:?}", path, device);

            let mut module =
                CModule::load_on_device(&config.path, device).map_err(|e| InferenceError::Load {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            module.set_eval();

            Ok(Self {
                module: Mutex::new(module),
                device,
                layout: config.input_layout,
                apply_softmax: config.apply_softmax,
                description: format!("torchscript:{} ({:?})", path, device),
            })
        }

        fn to_tensor(&self, batch: &Array4<f32>) -> Tensor {
            let (n, h, w, c) = batch.dim();
            let values: Vec<f32> = batch.iter().copied().collect();
            let tensor = Tensor::from_slice(&values).view([n as i64, h as i64, w as i64, c as i64]);
            let tensor = match self.layout {
                InputLayout::Nhwc => tensor,
                InputLayout::Nchw => tensor.permute([0, 3, 1, 2]).contiguous(),
            };
            tensor.to_device(self.device)
        }
    }

    impl ScoreModel for TorchModel {
        fn predict(&self, batch: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            let input = self.to_tensor(batch);
            let module = self
                .module
                .lock()
                .map_err(|_| InferenceError::Forward("model lock poisoned".into()))?;

            let output = tch::no_grad(|| module.forward_ts(&[input]))?;
            let output = if self.apply_softmax {
                output.softmax(-1, Kind::Float)
            } else {
                output.to_kind(Kind::Float)
            };
            let flat = output.to_device(Device::Cpu).view([-1]);
            Ok(Vec::<f32>::try_from(&flat)?)
        }

        fn describe(&self) -> String {
            self.description.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputLayout;
    use std::path::PathBuf;

    #[cfg(not(feature = "torch"))]
    #[test]
    fn load_without_backend_is_an_error() {
        let config = ModelConfig {
            path: PathBuf::from("model_uas1.pt"),
            input_layout: InputLayout::Nhwc,
            apply_softmax: false,
        };
        let err = match load_model(&config) {
            Err(err) => err,
            Ok(_) => panic!("loaded a model without a backend"),
        };
        assert!(matches!(err, InferenceError::BackendUnavailable));
        assert!(err.to_string().contains("--features torch"));
    }

    #[cfg(feature = "torch")]
    #[test]
    fn missing_artifact_fails_to_load() {
        let config = ModelConfig {
            path: PathBuf::from("/nonexistent/model.pt"),
            input_layout: InputLayout::Nhwc,
            apply_softmax: false,
        };
        assert!(matches!(load_model(&config), Err(InferenceError::Load { .. })));
    }
}
