mod components;

use components::handlers;
use components::header::render_header;
use components::preview_area::render_preview_area;
use components::results::render_results;
use components::theme_toggle::render_theme_toggle;
use components::upload_section::render_upload_section;
use components::utils::render_error_message;
use gloo_events::EventListener;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::{LabelsResponse, PredictionResponse};
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, DragEvent};
use yew::prelude::*;

/// The image currently on the dashboard.
#[derive(Clone)]
pub struct FileData {
    file: GlooFile,
    preview_url: ObjectUrl,
}

pub enum Msg {
    // File operations
    FileSelected(GlooFile),
    ClearFile,

    // Prediction
    Predict,
    PredictionResult(PredictionResponse),
    LabelsLoaded(LabelsResponse),

    // UI states
    SetError(Option<String>),
    SetDragging(bool),
    ToggleTheme,
    PreviewLoaded,
    PreviewFailed,

    // Input events
    HandleDrop(DragEvent),
    HandlePaste(ClipboardEvent),
}

pub struct Model {
    file: Option<FileData>,
    result: Option<PredictionResponse>,
    labels: Option<LabelsResponse>,
    loading: bool,
    error: Option<String>,
    is_dragging: bool,
    paste_listener: Option<EventListener>,
    theme: String,
    preview_loading: bool,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let mut model = Self {
            file: None,
            result: None,
            labels: None,
            loading: false,
            error: None,
            is_dragging: false,
            paste_listener: None,
            theme: handlers::stored_theme(),
            preview_loading: false,
        };
        handlers::apply_theme(&model.theme);

        if let Some(window) = web_sys::window() {
            let link = ctx.link().clone();
            let listener = EventListener::new(&window, "paste", move |event| {
                if let Some(clipboard_event) = event.dyn_ref::<ClipboardEvent>() {
                    link.send_message(Msg::HandlePaste(clipboard_event.clone()));
                }
            });
            model.paste_listener = Some(listener);
        }

        handlers::fetch_labels(ctx);
        model
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::FileSelected(file) => handlers::handle_file_selected(self, file),
            Msg::ClearFile => handlers::handle_clear_file(self),

            Msg::Predict => handlers::handle_predict(self, ctx),
            Msg::PredictionResult(response) => handlers::handle_prediction_result(self, response),
            Msg::LabelsLoaded(labels) => {
                self.labels = Some(labels);
                true
            }

            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
                true
            }
            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }
            Msg::ToggleTheme => handlers::handle_toggle_theme(self),
            Msg::PreviewLoaded => handlers::handle_preview_loaded(self),
            Msg::PreviewFailed => handlers::handle_preview_failed(self),

            Msg::HandleDrop(event) => handlers::handle_drop(self, ctx, event),
            Msg::HandlePaste(event) => handlers::handle_paste(ctx, event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }
                { render_theme_toggle(&self.theme, ctx.link()) }

                <main class="main-content">
                    { render_upload_section(self, ctx) }
                    { render_preview_area(self, ctx) }
                    { render_error_message(self) }
                    { render_results(self) }
                </main>

                <footer class="app-footer">
                    { render_footer(self) }
                </footer>
            </div>
        }
    }
}

fn render_footer(model: &Model) -> Html {
    match &model.labels {
        Some(labels) => html! {
            <p>{ format!(
                "Classes: {} | accepted at >= {:.0}% confidence and >= {:.0} pt margin",
                labels.class_names.join(" / "),
                labels.confidence_threshold * 100.0,
                labels.margin_threshold * 100.0,
            ) }</p>
        },
        None => html! { <p>{"Fresh & Rotten Detection"}</p> },
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<Model>::new().render();
}
