//! Cookie service: set/get/clear httpOnly auth cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use vendo_core::auth::tokens::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
use vendo_core::models::auth::TokenPair;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "vendo_access";

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "vendo_refresh";

/// Build a httpOnly cookie for the access token.
pub fn access_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(false) // TODO: set true once the deployment terminates TLS
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(ACCESS_TOKEN_TTL_SECS))
        .build()
}

/// Build a httpOnly cookie for the refresh token.
pub fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(REFRESH_TOKEN_TTL_SECS))
        .build()
}

/// Attach both tokens of a freshly issued pair to the jar.
pub fn with_session(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(access_cookie(&pair.access_token))
        .add(refresh_cookie(&pair.refresh_token))
}

/// Replace both auth cookies with expired ones, clearing client state.
pub fn without_session(jar: CookieJar) -> CookieJar {
    let clear = |name: &str| {
        Cookie::build((name.to_string(), String::new()))
            .http_only(true)
            .secure(false)
            .same_site(SameSite::Lax)
            .path("/".to_string())
            .max_age(Duration::ZERO)
            .build()
    };
    jar.add(clear(ACCESS_COOKIE)).add(clear(REFRESH_COOKIE))
}
