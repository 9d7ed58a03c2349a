use serde::{Deserialize, Serialize};
use shared::FruitClass;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("{0}")]
    Invalid(String),
}

/// Memory layout the model expects for its single input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// `[batch, height, width, channels]`, what the pipeline produces.
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`, permuted before the forward pass.
    Nchw,
}

/// Decision constants and model I/O options. Defaults are the values the
/// Fresh/Rotten model was deployed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Class names in model output order.
    pub class_names: Vec<String>,
    /// `[width, height]` the image is resized to.
    pub target_size: [u32; 2],
    pub confidence_threshold: f64,
    pub margin_threshold: f64,
    pub input_layout: InputLayout,
    /// Apply softmax to raw model outputs; leave off for models ending in a softmax layer.
    pub apply_softmax: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            class_names: FruitClass::names(),
            target_size: [150, 150],
            confidence_threshold: 0.85,
            margin_threshold: 0.40,
            input_layout: InputLayout::Nhwc,
            apply_softmax: false,
        }
    }
}

impl ClassifierConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&config_str).map_err(|err| match err {
            ConfigError::Yaml { source, .. } => ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: ClassifierConfig =
            serde_yaml::from_str(config_str).map_err(|source| ConfigError::Yaml {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.class_names.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "at least two class names are required, got {}",
                self.class_names.len()
            )));
        }
        if self.class_names.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid("class names must not be empty".into()));
        }
        if self.target_size.contains(&0) {
            return Err(ConfigError::Invalid(format!(
                "target size must be non-zero, got {:?}",
                self.target_size
            )));
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("margin_threshold", self.margin_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.target_size[0]
    }

    pub fn height(&self) -> u32 {
        self.target_size[1]
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub input_layout: InputLayout,
    pub apply_softmax: bool,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub dashboard_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub classifier: ClassifierConfig,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl AppConfig {
    /// Reads `HOST`, `PORT`, `MODEL_PATH`, `DASHBOARD_DIR`, `MAX_UPLOAD_BYTES`
    /// and the optional `CLASSIFIER_CONFIG` YAML file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_env("PORT", 5000u16)?;
        let max_upload_bytes = parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("model_uas1.pt"));

        let dashboard_dir = env::var("DASHBOARD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| match env::var("CARGO_MANIFEST_DIR") {
                Ok(manifest_dir) => PathBuf::from(format!("{}/../frontend/dist", manifest_dir)),
                Err(_) => PathBuf::from("/usr/src/app/frontend/dist"),
            });

        let classifier = match env::var("CLASSIFIER_CONFIG") {
            Ok(path) => {
                log::info!("Loading classifier config from {}", path);
                ClassifierConfig::load(Path::new(&path))?
            }
            Err(_) => ClassifierConfig::default(),
        };

        Ok(Self {
            host,
            port,
            model_path,
            dashboard_dir,
            max_upload_bytes,
            classifier,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model(&self) -> ModelConfig {
        ModelConfig {
            path: self.model_path.clone(),
            input_layout: self.classifier.input_layout,
            apply_softmax: self.classifier.apply_softmax,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_deployed_model() {
        let config = ClassifierConfig::default();
        assert_eq!(config.class_names, vec!["Fresh", "Rotten"]);
        assert_eq!(config.target_size, [150, 150]);
        assert_eq!(config.confidence_threshold, 0.85);
        assert_eq!(config.margin_threshold, 0.40);
        assert_eq!(config.input_layout, InputLayout::Nhwc);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let config = ClassifierConfig::from_yaml("margin_threshold: 0.25\ninput_layout: nchw\n").unwrap();
        assert_eq!(config.margin_threshold, 0.25);
        assert_eq!(config.confidence_threshold, 0.85);
        assert_eq!(config.input_layout, InputLayout::Nchw);
        assert_eq!(config.class_names, vec!["Fresh", "Rotten"]);
    }

    #[test]
    fn rejects_single_class() {
        let err = ClassifierConfig::from_yaml("class_names: [Fresh]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = ClassifierConfig::from_yaml("confidence_threshold: 1.5\n").unwrap_err();
        assert!(err.to_string().contains("confidence_threshold"));
    }

    #[test]
    fn rejects_zero_target_size() {
        let err = ClassifierConfig::from_yaml("target_size: [0, 150]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_reports_path_on_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "class_names: [Fresh, Rotten").unwrap();

        let err = ClassifierConfig::load(file.path()).unwrap_err();
        match err {
            ConfigError::Yaml { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "class_names: [Fresh, Rotten]\nconfidence_threshold: 0.9").unwrap();

        let config = ClassifierConfig::load(file.path()).unwrap();
        assert_eq!(config.confidence_threshold, 0.9);
    }
}
