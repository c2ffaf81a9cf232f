//! Verification of the sessions issued by the external auth provider.
//!
//! The provider logs users in and stores a [Token] in an encrypted private
//! cookie. The key is shared through the `SECRET` environment variable. Route
//! handlers behind [auth_guard] receive the logged in user with
//! `Extension(user_id): Extension<UserID>`.

mod cookie;
mod middleware;
mod token;

pub use cookie::set_auth_cookie;
pub use middleware::auth_guard;
pub use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
