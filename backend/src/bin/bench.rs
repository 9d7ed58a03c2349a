use clap::Parser;
use freshcheck::bench::{BenchmarkConfig, run_benchmark};
use freshcheck::config::{ClassifierConfig, ModelConfig};
use freshcheck::model::load_model;
use freshcheck::pipeline::Pipeline;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "freshcheck-bench")]
#[command(author, version, about = "Time preprocessing + inference on one image")]
struct Args {
    /// TorchScript model artifact
    #[arg(short, long, env = "MODEL_PATH", default_value = "model_uas1.pt")]
    model: PathBuf,

    /// Image to classify
    #[arg(short, long, default_value = "apple.jpg")]
    image: PathBuf,

    /// Classifier YAML overriding target size and model I/O options
    #[arg(short, long, env = "CLASSIFIER_CONFIG")]
    config: Option<PathBuf>,

    /// Untimed iterations after the first run
    #[arg(long, default_value = "3")]
    warmup: usize,

    /// Timed iterations
    #[arg(short = 'n', long, default_value = "20")]
    iterations: usize,

    /// Write the report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let classifier = match &args.config {
        Some(path) => ClassifierConfig::load(path)?,
        None => ClassifierConfig::default(),
    };

    let image = image::open(&args.image)
        .map_err(|e| format!("Failed to open {}: {}", args.image.display(), e))?;

    let model = load_model(&ModelConfig {
        path: args.model.clone(),
        input_layout: classifier.input_layout,
        apply_softmax: classifier.apply_softmax,
    })?;
    let pipeline = Pipeline::new(model, classifier);

    let config = BenchmarkConfig {
        warmup_iterations: args.warmup,
        iterations: args.iterations,
    };
    let report = run_benchmark(&pipeline, &image, &config)?;
    println!("{}", report);

    if let Some(path) = &args.output {
        report.save(path)?;
        log::info!("Report written to {}", path.display());
    }
    Ok(())
}
