use lombok::AllArgsConstructor;
use thiserror::Error;

use crate::database::models::{
    ingredient::{Ingredient, IngredientFields},
    recipe::{Recipe, RecipeFields},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("could not get a database connection: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("recipe {0} does not exist")]
    RecipeNotFound(i32),
    #[error("ingredient {ingredient_id} does not belong to recipe {recipe_id}")]
    ForeignIngredient { recipe_id: i32, ingredient_id: i32 },
    #[error("in-memory store lock was poisoned")]
    Poisoned,
}

/// One ingredient change applied while saving a recipe.
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientWrite {
    Create(IngredientFields),
    Update(i32, IngredientFields),
    Delete(i32),
}

/// Everything written by one recipe save. Applied as a single unit.
#[derive(AllArgsConstructor, Debug, Clone, PartialEq)]
pub struct RecipeSave {
    /// `None` creates a new recipe.
    pub recipe_id: Option<i32>,
    pub fields: RecipeFields,
    pub ingredients: Vec<IngredientWrite>,
}

#[derive(AllArgsConstructor, Debug, Clone, PartialEq)]
pub struct RecipeImport {
    pub fields: RecipeFields,
    pub ingredients: Vec<IngredientFields>,
}

#[derive(AllArgsConstructor, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub recipes: usize,
    pub ingredients: usize,
}

/// Persistence of recipes and their ingredients.
///
/// Every write method is atomic: on error nothing it touched is committed.
pub trait RecipeStore: Send + Sync {
    /// All recipes, newest first.
    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    fn get_recipe(&self, id: i32) -> Result<Option<Recipe>, StoreError>;

    /// Ingredients of one recipe in insertion order.
    fn list_ingredients(&self, recipe_id: i32) -> Result<Vec<Ingredient>, StoreError>;

    fn save_recipe(&self, save: RecipeSave) -> Result<Recipe, StoreError>;

    /// Deletes the recipe and its ingredients. Returns `false` when there was
    /// nothing to delete.
    fn delete_recipe(&self, id: i32) -> Result<bool, StoreError>;

    /// Wipes every recipe and inserts `recipes` in their place.
    fn replace_all(&self, recipes: Vec<RecipeImport>) -> Result<ImportSummary, StoreError>;
}
