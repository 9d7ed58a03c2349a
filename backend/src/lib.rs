pub mod bench;
pub mod config;
pub mod error;
pub mod intake;
pub mod model;
pub mod pipeline;
pub mod routes;

pub use config::{AppConfig, ClassifierConfig};
pub use model::{InferenceError, ScoreModel, load_model};
pub use pipeline::{Decision, Pipeline};
