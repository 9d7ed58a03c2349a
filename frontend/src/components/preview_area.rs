use super::super::{Model, Msg};
use super::utils::debounce;
use yew::prelude::*;

pub fn render_preview_area(model: &Model, ctx: &Context<Model>) -> Html {
    let Some(file_data) = &model.file else {
        return html! {};
    };

    let link = ctx.link().clone();

    html! {
        <div id="preview-container">
            if model.preview_loading {
                <div class="loading-preview">
                    <i class="fa-solid fa-spinner fa-spin fa-2x"></i>
                    <p style="margin-left: 10px;">{"Loading preview..."}</p>
                </div>
            }
            // Kept mounted while hidden so the browser fires `load`.
            <img id="actual-image-preview"
                src={file_data.preview_url.to_string()}
                alt={file_data.file.name()}
                hidden={model.preview_loading}
                onload={link.callback(|_: Event| Msg::PreviewLoaded)}
                onerror={link.callback(|_: Event| Msg::PreviewFailed)} />
            <div class="button-container">
                <button
                    id="clear-btn"
                    class="analyze-btn"
                    style="background-color: var(--clear-color);"
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::ClearFile)
                    })}
                >
                    <i class="fa-solid fa-trash"></i>{" Clear"}
                </button>
                <button
                    class="analyze-btn"
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::Predict)
                    })}
                    disabled={model.loading}
                >
                    { render_predict_button_content(model, &file_data.file.name()) }
                </button>
            </div>
        </div>
    }
}

fn render_predict_button_content(model: &Model, filename: &str) -> Html {
    if model.loading {
        return html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Analyzing..."}</> };
    }

    let display_name = if filename.chars().count() > 20 {
        format!("{}...", filename.chars().take(17).collect::<String>())
    } else {
        filename.to_string()
    };

    html! { <><i class="fa-solid fa-magnifying-glass"></i>{ format!(" Predict \"{}\"", display_name) }</> }
}
