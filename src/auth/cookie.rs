//! Reading and writing the private cookie that carries the session [Token].

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID, auth::Token};

/// The name of the cookie holding the serialized [Token].
pub(crate) const COOKIE_TOKEN: &str = "token";

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// The session expires `duration` from the current time.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns a [serde_json::Error] if the token cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, serde_json::Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;
    let token = serde_json::to_string(&Token {
        user_id,
        expires_at,
    })?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Get the session token from the private cookie jar.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the cookie is missing, could not be
/// decrypted or deserialized, or the session has expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::Unauthorized)?;

    let token: Token = serde_json::from_str(cookie.value()).map_err(|error| {
        tracing::warn!("could not deserialize auth token: {error}");
        Error::Unauthorized
    })?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        tracing::debug!("auth token for user {} has expired", token.user_id);
        return Err(Error::Unauthorized);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use time::Duration;

    use crate::{
        Error, UserID,
        auth::cookie::{get_token_from_cookies, set_auth_cookie},
    };

    #[test]
    fn round_trips_user_id() {
        let jar = PrivateCookieJar::new(Key::generate());

        let jar = set_auth_cookie(jar, UserID::new(7), Duration::minutes(5)).unwrap();
        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, UserID::new(7));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let jar = PrivateCookieJar::new(Key::generate());

        let jar = set_auth_cookie(jar, UserID::new(7), Duration::minutes(-5)).unwrap();

        assert_eq!(get_token_from_cookies(&jar), Err(Error::Unauthorized));
    }

    #[test]
    fn missing_cookie_is_unauthorized() {
        let jar = PrivateCookieJar::new(Key::generate());

        assert_eq!(get_token_from_cookies(&jar), Err(Error::Unauthorized));
    }
}
