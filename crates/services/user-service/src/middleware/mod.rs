//! HTTP middleware.

mod csrf;

pub use csrf::{csrf_middleware, tokens_match, CSRF_COOKIE, CSRF_HEADER, CSRF_HEADER_ALT};
