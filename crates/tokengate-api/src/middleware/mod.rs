//! HTTP middleware.

mod auth;

pub use auth::{require_roles, Authenticated, MaybeAuthenticated, RouteGuard};
