use super::super::Model;
use yew::prelude::*;

pub fn render_results(model: &Model) -> Html {
    let Some(result) = &model.result else {
        return html! {};
    };

    let Some(confidence) = result.confidence.filter(|_| result.is_recognized()) else {
        return html! {
            <div class="results-container not-recognized">
                <div class="result-header">
                    <h2><i class="fa-solid fa-circle-question"></i>{" Not Recognized"}</h2>
                    <p>{"The image does not look like a fruit the model knows, or the model is unsure."}</p>
                </div>
            </div>
        };
    };

    let is_fresh = result.class == shared::FruitClass::Fresh.as_ref();
    let analyzed_filename = model
        .file
        .as_ref()
        .map_or_else(|| "Analyzed Image".to_string(), |fd| fd.file.name());

    html! {
        <div class={classes!("results-container", if is_fresh { "fresh" } else { "rotten" })}>
            <div class="result-header">
                <h2 title={format!("Prediction for: {}", analyzed_filename)}>
                    {
                        if is_fresh {
                            html! { <i class="fa-solid fa-seedling"></i> }
                        } else {
                            html! { <i class="fa-solid fa-biohazard"></i> }
                        }
                    }
                    { format!(" {}", result.class) }
                    <span class="analyzed-filename-display">{format!("({})", analyzed_filename)}</span>
                </h2>
                <div class="confidence-meter">
                    <div class="meter-label">{"Confidence:"}</div>
                    <div class="meter">
                        <div class="meter-fill" style={format!("width: {}%", confidence)}></div>
                    </div>
                    <div class="meter-value">{format!("{:.2}%", confidence)}</div>
                </div>
            </div>
        </div>
    }
}
