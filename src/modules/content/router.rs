use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    delete_content, list_contents, stream_content, update_content, upload_content,
};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn init_content_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_contents))
        .route(
            "/blocks/{block_id}",
            patch(update_content).delete(delete_content),
        )
        .route(
            "/blocks/{block_id}/upload",
            post(upload_content).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/blocks/{block_id}/stream", get(stream_content))
}
