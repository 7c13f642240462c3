use axum::response::IntoResponse;

// Plain-text banner for the root path; not part of the documented API.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
