/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth::access::protect(...) で route 単位に権限ガードを掛ける
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
