pub mod handlers;
pub mod store;

pub use store::{DiskMedia, MediaStore};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::router()
}
