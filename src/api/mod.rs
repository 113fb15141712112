/*
 * Responsibility
 * - axum 側の入口 (gateway) と demo 用 handler / route 登録の公開ポイント
 */
pub mod gateway;
pub mod handlers;
pub mod routes;

pub use gateway::router;
