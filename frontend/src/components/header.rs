use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-apple-whole"></i> {" Fresh & Rotten Detection"}</h1>
            <p class="subtitle">{"Upload a fruit photo via button, drag & drop, or paste"}</p>
        </header>
    }
}
