pub mod handlers;
pub mod language;
pub mod patch;

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderName};
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{Grants, Permission, Principal};
use crate::error::AppError;
use crate::store::RecipeStore;
use crate::views;
use crate::workflow;

/// Request-independent settings of the web layer.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub grants: Grants,
    pub remote_user_header: HeaderName,
    /// Supported language codes; the first one is the default.
    pub languages: Vec<String>,
    pub media_dir: PathBuf,
}

impl SiteConfig {
    pub fn default_language(&self) -> &str {
        self.languages.first().map(String::as_str).unwrap_or("en")
    }

    pub fn resolve_language<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|code| self.languages.iter().any(|language| language == code))
            .unwrap_or_else(|| self.default_language())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecipeStore>,
    pub site: Arc<SiteConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecipeStore>, site: SiteConfig) -> Self {
        Self {
            store,
            site: Arc::new(site),
        }
    }

    /// Runs store work on the blocking pool; store calls may wait on the
    /// database.
    pub async fn with_store<T, F>(&self, work: F) -> Result<T, AppError>
    where
        F: FnOnce(&dyn RecipeStore) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || work(store.as_ref())).await?
    }

    pub fn page(&self, language: &str, title: &str, body: &str) -> Html<String> {
        Html(views::layout(language, &self.site.languages, title, body))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(&state.site.remote_user_header)
            .and_then(|value| value.to_str().ok());

        Ok(state.site.grants.principal(name))
    }
}

/// A principal allowed to change recipes. Rejects before the body is read.
pub struct Editor(pub Principal);

#[axum::async_trait]
impl FromRequestParts<AppState> for Editor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = match Principal::from_request_parts(parts, state).await {
            Ok(principal) => principal,
            Err(never) => match never {},
        };
        workflow::authorize(&principal, Permission::ChangeRecipe)?;

        Ok(Editor(principal))
    }
}

pub fn router(state: AppState) -> Router {
    let media = ServeDir::new(&state.site.media_dir);

    Router::new()
        .route("/", get(handlers::recipe_list))
        .route("/health", get(|| async { "OK" }))
        .route(
            "/recipe/create/",
            get(handlers::create_form).post(handlers::create_submit),
        )
        .route(
            "/recipe/create/add-ingredient-form/",
            post(handlers::ingredient_form_action),
        )
        .route(
            "/recipe/:id/",
            get(handlers::recipe_detail).delete(handlers::delete_recipe),
        )
        .route(
            "/recipe/:id/change/",
            get(handlers::change_form).post(handlers::change_submit),
        )
        .route("/recipe/:id/ingredients/", get(handlers::recipe_ingredients))
        .route("/set_language/", post(language::set_language))
        .nest_service("/media", media)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
