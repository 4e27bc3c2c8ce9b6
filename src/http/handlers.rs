use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::language::Language;
use super::patch::{patch_response, read_signals, ElementPatch, PatchMode};
use super::{AppState, Editor};
use crate::auth::{Permission, Principal};
use crate::error::AppError;
use crate::formset::wire::FormData;
use crate::views::forms::{edit_page, ingredient_section, INGREDIENT_SECTION_ID};
use crate::views::recipes::{self, ingredient_list, INGREDIENT_LIST_ID};
use crate::workflow::{self, EditOutcome, EditPage, EditTarget};

type Fields = Form<Vec<(String, String)>>;

pub async fn recipe_list(
    State(state): State<AppState>,
    principal: Principal,
    Language(language): Language,
) -> Result<Html<String>, AppError> {
    let listed = state
        .with_store(|store| workflow::list_recipes(store))
        .await?;
    let body = recipes::recipe_list(&listed, principal.has_perm(Permission::ChangeRecipe));

    Ok(state.page(&language, "Recipes", &body))
}

pub async fn recipe_detail(
    State(state): State<AppState>,
    principal: Principal,
    Language(language): Language,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let detail = state
        .with_store(move |store| workflow::recipe_detail(store, &principal, id))
        .await?;

    Ok(state.page(&language, &detail.recipe.name, &recipes::recipe_detail(&detail)))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    state
        .with_store(move |store| workflow::delete_recipe(store, &principal, id))
        .await?;

    Ok(Redirect::to("/"))
}

#[derive(Debug, Default, Deserialize)]
pub struct SignalsQuery {
    datastar: Option<String>,
}

/// Re-renders `#ingredient-list` for the requested number of portions.
pub async fn recipe_ingredients(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<SignalsQuery>,
) -> Result<Response, AppError> {
    let signals = read_signals(query.datastar.as_deref());
    let scaled = state
        .with_store(move |store| workflow::scaled_ingredients(store, id, &signals))
        .await?;

    let patch =
        ElementPatch::new(ingredient_list(&scaled)).selector(format!("#{INGREDIENT_LIST_ID}"));

    Ok(patch_response(vec![patch]).into_response())
}

fn edit_title(page: &EditPage) -> String {
    match &page.recipe {
        Some(recipe) => format!("Edit {}", recipe.name),
        None => "New recipe".to_owned(),
    }
}

async fn show_form(
    state: AppState,
    principal: Principal,
    language: String,
    target: EditTarget,
) -> Result<Html<String>, AppError> {
    let page = state
        .with_store(move |store| workflow::show_edit_page(store, &principal, target))
        .await?;

    Ok(state.page(&language, &edit_title(&page), &edit_page(&page)))
}

async fn submit_form(
    state: AppState,
    principal: Principal,
    language: String,
    target: EditTarget,
    fields: Vec<(String, String)>,
) -> Result<Response, AppError> {
    let data = FormData::new(fields);
    let outcome = state
        .with_store(move |store| workflow::submit_edit(store, &principal, target, &data))
        .await?;

    match outcome {
        EditOutcome::Persisted(recipe) => {
            Ok(Redirect::to(&format!("/recipe/{}/", recipe.id)).into_response())
        }
        EditOutcome::Redisplayed(page) => {
            let html = state.page(&language, &edit_title(&page), &edit_page(&page));
            Ok((StatusCode::BAD_REQUEST, html).into_response())
        }
    }
}

pub async fn create_form(
    State(state): State<AppState>,
    principal: Principal,
    Language(language): Language,
) -> Result<Html<String>, AppError> {
    show_form(state, principal, language, EditTarget::Create).await
}

pub async fn create_submit(
    State(state): State<AppState>,
    Editor(principal): Editor,
    Language(language): Language,
    Form(fields): Fields,
) -> Result<Response, AppError> {
    submit_form(state, principal, language, EditTarget::Create, fields).await
}

pub async fn change_form(
    State(state): State<AppState>,
    principal: Principal,
    Language(language): Language,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    show_form(state, principal, language, EditTarget::Change(id)).await
}

pub async fn change_submit(
    State(state): State<AppState>,
    Editor(principal): Editor,
    Language(language): Language,
    Path(id): Path<i32>,
    Form(fields): Fields,
) -> Result<Response, AppError> {
    submit_form(state, principal, language, EditTarget::Change(id), fields).await
}

/// Adds or removes an ingredient row and sends the section back as a patch.
pub async fn ingredient_form_action(
    State(state): State<AppState>,
    Editor(principal): Editor,
    Form(fields): Fields,
) -> Result<Response, AppError> {
    let data = FormData::new(fields);
    let section = state
        .with_store(move |store| workflow::apply_form_action(store, &principal, &data))
        .await?;

    let patch = ElementPatch::new(ingredient_section(section.recipe.as_ref(), &section.formset))
        .selector(format!("#{INGREDIENT_SECTION_ID}"))
        .mode(PatchMode::Replace);

    Ok(patch_response(vec![patch]).into_response())
}
