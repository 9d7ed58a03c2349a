use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use freshcheck::config::AppConfig;
use freshcheck::model::load_model;
use freshcheck::pipeline::Pipeline;
use freshcheck::routes::{UploadLimit, configure_routes};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    log::info!(
        "Classes {:?}, target {}x{}, confidence >= {}, margin >= {}",
        config.classifier.class_names,
        config.classifier.width(),
        config.classifier.height(),
        config.classifier.confidence_threshold,
        config.classifier.margin_threshold
    );

    log::info!("Loading model from {}", config.model_path.display());
    let model = load_model(&config.model()).map_err(|e| {
        log::error!("Failed to load model at startup: {}", e);
        std::io::Error::other(format!("Model loading failed: {}", e))
    })?;
    log::info!("Model ready: {}", model.describe());

    let pipeline = web::Data::new(Pipeline::new(model, config.classifier.clone()));
    let limit = web::Data::new(UploadLimit(config.max_upload_bytes));
    let dashboard_dir = config.dashboard_dir.clone();
    let bind_address = config.bind_address();

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .wrap(actix_web::middleware::Logger::default())
            .app_data(pipeline.clone())
            .app_data(limit.clone())
            .configure(|cfg| configure_routes(cfg, &dashboard_dir))
    })
    .bind(&bind_address)?
    .run()
    .await
}
