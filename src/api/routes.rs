/*
 * Responsibility
 * - demo server の URL 構造を定義
 * - 認証 / admin が必要な route はここで決める
 */
use crate::routing::Dispatcher;

/// (path, method, handler, requires_auth, requires_admin)
pub const ROUTES: [(&str, &str, &str, bool, bool); 4] = [
    ("/auth", "GET", "auth", false, false),
    ("/", "GET", "page", false, false),
    ("/entity", "POST", "api", true, false),
    ("/admin", "POST", "admin", true, true),
];

/// Returns how many routes were accepted.
pub fn register(dispatcher: &mut Dispatcher) -> usize {
    ROUTES
        .iter()
        .filter(|(path, method, handler, auth, admin)| {
            dispatcher.register(path, method, handler, *auth, *admin)
        })
        .count()
}
