/*
 * Responsibility
 * - axum Router に紐づける共有コンテキスト (AppState)
 * - Dispatcher は登録完了後に Arc で共有する (dispatch は &self のみ)
 */
use std::sync::Arc;

use crate::routing::Dispatcher;

#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}
