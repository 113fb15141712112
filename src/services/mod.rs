/*
 * Responsibility
 * - ドメインサービス (token の検証/発行) の公開インターフェース
 */
pub mod auth;
