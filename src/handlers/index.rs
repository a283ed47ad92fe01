//! Status page handler

use axum::{extract::State, response::Html};

use crate::render;
use crate::AppState;

pub async fn page(State(state): State<AppState>) -> Html<String> {
    Html(render::status_page(&state.page_context(), None))
}
