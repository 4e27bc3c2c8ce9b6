use axum::extract::{FromRequestParts, Query, State};
use axum::http::{header, request::Parts, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::convert::Infallible;
use tracing::debug;

use super::AppState;

pub const LANGUAGE_COOKIE: &str = "recipe_viewer_language";
const LANGUAGE_COOKIE_DAYS: i64 = 365;

/// Active UI language, read from the language cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for Language {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let requested = jar.get(LANGUAGE_COOKIE).map(|cookie| cookie.value());

        Ok(Language(state.site.resolve_language(requested).to_owned()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LanguageChoice {
    language: Option<String>,
    next: Option<String>,
}

pub async fn set_language(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(query): Query<LanguageChoice>,
    form: Option<Form<LanguageChoice>>,
) -> impl IntoResponse {
    let form = form.map(|Form(form)| form).unwrap_or_default();

    let requested = form.language.as_deref().or(query.language.as_deref());
    let language = state.site.resolve_language(requested).to_owned();

    let next = form.next.as_deref().or(query.next.as_deref());
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok());
    let host = headers.get(header::HOST).and_then(|value| value.to_str().ok());
    let target = redirect_target(next, referer, host);
    debug!(%language, %target, "language switched");

    let cookie = Cookie::build((LANGUAGE_COOKIE, language))
        .path("/")
        .max_age(time::Duration::days(LANGUAGE_COOKIE_DAYS));

    (
        StatusCode::FOUND,
        jar.add(cookie),
        [(header::LOCATION, target)],
    )
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Where to send the user after switching: `next`, then the referring page
/// when it belongs to this site, then the home page.
pub fn redirect_target(next: Option<&str>, referer: Option<&str>, host: Option<&str>) -> String {
    if let Some(next) = next.filter(|next| is_local_path(next)) {
        return next.to_owned();
    }

    let Some(referer) = referer else {
        return "/".to_owned();
    };
    if is_local_path(referer) {
        return referer.to_owned();
    }

    let same_site = host.and_then(|host| {
        ["https://", "http://"]
            .iter()
            .find_map(|scheme| referer.strip_prefix(scheme)?.strip_prefix(host))
    });

    match same_site {
        Some("") => "/".to_owned(),
        Some(path) if is_local_path(path) => path.to_owned(),
        _ => "/".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wins_when_local() {
        assert_eq!(redirect_target(Some("/recipe/1/"), Some("/other/"), None), "/recipe/1/");
        assert_eq!(redirect_target(Some("//evil.example"), None, None), "/");
        assert_eq!(redirect_target(Some("https://evil.example/"), None, None), "/");
    }

    #[test]
    fn falls_back_to_same_site_referer() {
        let host = Some("recipes.local:8000");

        assert_eq!(
            redirect_target(None, Some("http://recipes.local:8000/recipe/2/"), host),
            "/recipe/2/"
        );
        assert_eq!(
            redirect_target(None, Some("https://recipes.local:8000"), host),
            "/"
        );
        assert_eq!(
            redirect_target(None, Some("http://recipes.local:8000.evil.example/"), host),
            "/"
        );
        assert_eq!(redirect_target(None, Some("http://elsewhere/x"), host), "/");
        assert_eq!(redirect_target(None, None, host), "/");
    }
}
