//! Embedded status page

use axum::response::Html;

const STATUS_PAGE: &str = include_str!("../../../../static/index.html");

/// Serve the device status viewer
pub async fn status_page() -> Html<&'static str> {
    Html(STATUS_PAGE)
}
