use serde_json::Value;
use tracing::{debug, info, trace_span};

use crate::auth::{Permission, Principal};
use crate::database::models::{ingredient::Ingredient, recipe::Recipe};
use crate::error::AppError;
use crate::formset::wire::{discover_prefix, FormAction, FormData};
use crate::formset::{IngredientFormSet, DEFAULT_PREFIX};
use crate::portions::{normalize_multiplier, scale, ScaledIngredient};
use crate::recipe_form::RecipeForm;
use crate::store::{RecipeSave, RecipeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Create,
    Change(i32),
}

impl EditTarget {
    fn recipe_id(&self) -> Option<i32> {
        match self {
            EditTarget::Create => None,
            EditTarget::Change(id) => Some(*id),
        }
    }
}

/// Everything the edit page shows.
#[derive(Debug, Clone)]
pub struct EditPage {
    /// `None` while creating.
    pub recipe: Option<Recipe>,
    pub form: RecipeForm,
    pub formset: IngredientFormSet,
}

#[derive(Debug)]
pub enum EditOutcome {
    Persisted(Recipe),
    Redisplayed(EditPage),
}

#[derive(Debug, Clone)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub can_change: bool,
    pub can_delete: bool,
}

/// The ingredient rows after an add/remove action.
#[derive(Debug, Clone)]
pub struct IngredientSection {
    pub recipe: Option<Recipe>,
    pub formset: IngredientFormSet,
}

pub fn authorize(principal: &Principal, permission: Permission) -> Result<(), AppError> {
    if principal.has_perm(permission) {
        return Ok(());
    }

    Err(AppError::Forbidden(permission.code()))
}

fn load_recipe(store: &dyn RecipeStore, id: i32) -> Result<Recipe, AppError> {
    store.get_recipe(id)?.ok_or(AppError::NotFound)
}

fn load(
    store: &dyn RecipeStore,
    recipe_id: Option<i32>,
) -> Result<(Option<Recipe>, Vec<Ingredient>), AppError> {
    match recipe_id {
        Some(id) => {
            let recipe = load_recipe(store, id)?;
            let ingredients = store.list_ingredients(id)?;
            Ok((Some(recipe), ingredients))
        }
        None => Ok((None, Vec::new())),
    }
}

pub fn list_recipes(store: &dyn RecipeStore) -> Result<Vec<Recipe>, AppError> {
    Ok(store.list_recipes()?)
}

pub fn recipe_detail(
    store: &dyn RecipeStore,
    principal: &Principal,
    id: i32,
) -> Result<RecipeDetail, AppError> {
    let recipe = load_recipe(store, id)?;
    let ingredients = store.list_ingredients(id)?;

    Ok(RecipeDetail {
        recipe,
        ingredients,
        can_change: principal.has_perm(Permission::ChangeRecipe),
        can_delete: principal.has_perm(Permission::DeleteRecipe),
    })
}

/// Ingredients of a recipe scaled by the `portions` signal.
pub fn scaled_ingredients(
    store: &dyn RecipeStore,
    id: i32,
    signals: &Value,
) -> Result<Vec<ScaledIngredient>, AppError> {
    load_recipe(store, id)?;
    let ingredients = store.list_ingredients(id)?;
    let multiplier = normalize_multiplier(signals.get("portions"));
    debug!(recipe_id = id, multiplier, "scaling ingredients");

    Ok(scale(&ingredients, multiplier))
}

pub fn show_edit_page(
    store: &dyn RecipeStore,
    principal: &Principal,
    target: EditTarget,
) -> Result<EditPage, AppError> {
    authorize(principal, Permission::ChangeRecipe)?;
    let (recipe, ingredients) = load(store, target.recipe_id())?;

    Ok(EditPage {
        form: RecipeForm::unbound(recipe.as_ref()),
        formset: IngredientFormSet::unbound(DEFAULT_PREFIX, ingredients),
        recipe,
    })
}

/// Authorize, load, bind, validate, then persist or redisplay.
pub fn submit_edit(
    store: &dyn RecipeStore,
    principal: &Principal,
    target: EditTarget,
    data: &FormData,
) -> Result<EditOutcome, AppError> {
    let span = trace_span!("submit_edit", ?target);
    let _guard = span.enter();

    authorize(principal, Permission::ChangeRecipe)?;
    let (recipe, ingredients) = load(store, target.recipe_id())?;

    let mut form = RecipeForm::bind(data);
    let mut formset = IngredientFormSet::bind(DEFAULT_PREFIX, ingredients, data)?;
    debug!("forms bound");

    let form_valid = form.validate();
    let formset_valid = formset.validate();

    let (Ok(fields), Ok(writes)) = (form.clean(), formset.save_plan()) else {
        debug!(form_valid, formset_valid, "forms invalid");
        return Ok(EditOutcome::Redisplayed(EditPage {
            recipe,
            form,
            formset,
        }));
    };

    let saved = store.save_recipe(RecipeSave::new(target.recipe_id(), fields, writes))?;
    info!(recipe_id = saved.id, "recipe persisted");

    Ok(EditOutcome::Persisted(saved))
}

pub fn apply_form_action(
    store: &dyn RecipeStore,
    principal: &Principal,
    data: &FormData,
) -> Result<IngredientSection, AppError> {
    authorize(principal, Permission::ChangeRecipe)?;

    let action = FormAction::from_data(data)?;

    let recipe_id = match data.get("recipe_id").map(str::trim) {
        None | Some("") => None,
        Some(id) => Some(
            id.parse::<i32>()
                .map_err(|_| AppError::malformed("Invalid recipe id."))?,
        ),
    };
    let (recipe, ingredients) = load(store, recipe_id)?;

    let prefix = discover_prefix(data)?;
    let mut formset = IngredientFormSet::bind(&prefix, ingredients, data)?;

    match action {
        FormAction::AddRow => formset.add_row()?,
        FormAction::RemoveRow(target) => formset.remove_row(&target)?,
    }
    debug!(?recipe_id, rows = formset.total_forms(), "form action applied");

    Ok(IngredientSection { recipe, formset })
}

pub fn delete_recipe(
    store: &dyn RecipeStore,
    principal: &Principal,
    id: i32,
) -> Result<(), AppError> {
    authorize(principal, Permission::DeleteRecipe)?;

    if !store.delete_recipe(id)? {
        return Err(AppError::NotFound);
    }
    info!(recipe_id = id, "recipe deleted");

    Ok(())
}
