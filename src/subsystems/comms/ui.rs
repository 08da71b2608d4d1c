//! Chat widget, compiled into the binary.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../../ui/index.html");

/// GET /: the chat widget.
pub(super) async fn root() -> Html<&'static str> {
    Html(INDEX_HTML)
}
