use super::super::{FileData, Model, Msg};
use super::utils::extract_image_files;
use gloo_file::{File as GlooFile, ObjectUrl};
use gloo_net::http::Request;
use gloo_storage::{LocalStorage, Storage};
use shared::{ErrorResponse, LabelsResponse, PredictionResponse};
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, DragEvent, FileList};
use yew::prelude::*;

const THEME_KEY: &str = "freshcheck.theme";

/// Shows the spinner until the preview `<img>` fires `load` or `error`.
pub fn handle_file_selected(model: &mut Model, file: GlooFile) -> bool {
    let preview_url = ObjectUrl::from(file.clone());
    model.file = Some(FileData { file, preview_url });
    model.result = None;
    model.error = None;
    model.preview_loading = true;
    true
}

pub fn handle_clear_file(model: &mut Model) -> bool {
    model.file = None;
    model.result = None;
    model.error = None;
    model.loading = false;
    true
}

pub fn handle_predict(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some(file) = model.file.as_ref().map(|fd| fd.file.clone()) else {
        ctx.link()
            .send_message(Msg::SetError(Some("Choose an image first.".into())));
        return false;
    };

    model.loading = true;
    model.error = None;
    model.result = None;
    send_prediction_request(ctx, file);
    true
}

pub fn handle_prediction_result(model: &mut Model, response: PredictionResponse) -> bool {
    model.result = Some(response);
    model.loading = false;
    true
}

pub fn handle_preview_loaded(model: &mut Model) -> bool {
    model.preview_loading = false;
    true
}

pub fn handle_preview_failed(model: &mut Model) -> bool {
    model.preview_loading = false;
    model.error = Some("Could not preview this image.".into());
    true
}

pub fn stored_theme() -> String {
    LocalStorage::get::<String>(THEME_KEY).unwrap_or_else(|_| "light".to_string())
}

pub fn apply_theme(theme: &str) {
    let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    else {
        return;
    };

    let result = if theme == "dark" {
        body.class_list().add_1("dark-mode")
    } else {
        body.class_list().remove_1("dark-mode")
    };
    if result.is_err() {
        log::warn!("Failed to apply {} theme", theme);
    }
}

pub fn handle_toggle_theme(model: &mut Model) -> bool {
    model.theme = if model.theme == "light" { "dark" } else { "light" }.to_string();
    apply_theme(&model.theme);
    if let Err(e) = LocalStorage::set(THEME_KEY, &model.theme) {
        log::warn!("Could not persist theme: {}", e);
    }
    true
}

pub fn handle_drop(model: &mut Model, ctx: &Context<Model>, event: DragEvent) -> bool {
    event.prevent_default();
    model.is_dragging = false;

    if let Some(file_list) = event.data_transfer().and_then(|dt| dt.files()) {
        process_file_list(ctx, file_list);
    }

    true
}

pub fn handle_paste(ctx: &Context<Model>, event: ClipboardEvent) -> bool {
    if let Some(file_list) = event.clipboard_data().and_then(|dt| dt.files()) {
        if file_list.length() > 0 {
            event.prevent_default();
            process_file_list(ctx, file_list);
            return true;
        }
    }
    false
}

/// Takes the first image in the list; the dashboard works on one image at a time.
pub fn process_file_list(ctx: &Context<Model>, file_list: FileList) {
    let skipped = file_list.length() as usize;
    match extract_image_files(&file_list).into_iter().next() {
        Some(file) => ctx.link().send_message(Msg::FileSelected(file)),
        None if skipped > 0 => {
            log::warn!("Skipping {} non-image file(s)", skipped);
            ctx.link()
                .send_message(Msg::SetError(Some("Only image files can be analyzed.".into())));
        }
        None => {}
    }
}

pub fn send_prediction_request(ctx: &Context<Model>, file: GlooFile) {
    let link = ctx.link().clone();
    spawn_local(async move {
        let msg = match post_image(&file).await {
            Ok(response) => Msg::PredictionResult(response),
            Err(message) => Msg::SetError(Some(message)),
        };
        link.send_message(msg);
    });
}

async fn post_image(file: &GlooFile) -> Result<PredictionResponse, String> {
    let form_data =
        web_sys::FormData::new().map_err(|_| "Could not create upload form.".to_string())?;
    form_data
        .append_with_blob("file", file.as_ref())
        .map_err(|_| "Could not attach the image.".to_string())?;

    let response = Request::post("/predict")
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if response.ok() {
        return response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e));
    }

    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => Err(body.error),
        Err(_) => Err(format!("Server error: {}", status)),
    }
}

pub fn fetch_labels(ctx: &Context<Model>) {
    let link = ctx.link().clone();
    spawn_local(async move {
        let labels = match Request::get("/api/labels").send().await {
            Ok(resp) if resp.ok() => resp.json::<LabelsResponse>().await.ok(),
            Ok(resp) => {
                log::warn!("Labels request failed with {}", resp.status());
                None
            }
            Err(e) => {
                log::warn!("Labels request failed: {}", e);
                None
            }
        };
        if let Some(labels) = labels {
            link.send_message(Msg::LabelsLoaded(labels));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        Model {
            file: None,
            result: None,
            labels: None,
            loading: false,
            error: None,
            is_dragging: false,
            paste_listener: None,
            theme: "light".into(),
            preview_loading: true,
        }
    }

    #[test]
    fn preview_spinner_stops_when_image_loads() {
        let mut model = model();
        assert!(handle_preview_loaded(&mut model));
        assert!(!model.preview_loading);
        assert!(model.error.is_none());
    }

    #[test]
    fn broken_preview_stops_spinner_and_reports() {
        let mut model = model();
        assert!(handle_preview_failed(&mut model));
        assert!(!model.preview_loading);
        assert_eq!(model.error.as_deref(), Some("Could not preview this image."));
    }
}
