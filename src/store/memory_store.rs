use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use itertools::Itertools;

use super::recipe_store::{
    ImportSummary, IngredientWrite, RecipeImport, RecipeSave, RecipeStore, StoreError,
};
use crate::database::models::{
    ingredient::Ingredient,
    recipe::{Recipe, RecipeFields},
};

/// Process-local store with the same contract as the database one.
///
/// Writes are applied to a copy of the state which replaces the original only
/// once every step succeeded.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default, Clone)]
struct MemoryState {
    recipes: BTreeMap<i32, Recipe>,
    ingredients: BTreeMap<i32, Ingredient>,
    last_recipe_id: i32,
    last_ingredient_id: i32,
}

impl MemoryState {
    fn insert_recipe(&mut self, fields: RecipeFields) -> Recipe {
        self.last_recipe_id += 1;
        let now = Utc::now();
        let recipe = Recipe::new(
            self.last_recipe_id,
            fields.name,
            fields.steps,
            fields.image,
            now,
            now,
        );
        self.recipes.insert(recipe.id, recipe.clone());
        recipe
    }

    fn insert_ingredient(&mut self, recipe_id: i32, name: String, quantity: f64, unit: String) {
        self.last_ingredient_id += 1;
        let ingredient = Ingredient::new(self.last_ingredient_id, recipe_id, name, quantity, unit);
        self.ingredients.insert(ingredient.id, ingredient);
    }

    fn owned_ingredient(
        &mut self,
        recipe_id: i32,
        ingredient_id: i32,
    ) -> Result<&mut Ingredient, StoreError> {
        self.ingredients
            .get_mut(&ingredient_id)
            .filter(|ingredient| ingredient.recipe_id == recipe_id)
            .ok_or(StoreError::ForeignIngredient {
                recipe_id,
                ingredient_id,
            })
    }

    fn apply(&mut self, save: RecipeSave) -> Result<Recipe, StoreError> {
        let recipe = match save.recipe_id {
            Some(id) => {
                let recipe = self
                    .recipes
                    .get_mut(&id)
                    .ok_or(StoreError::RecipeNotFound(id))?;
                recipe.name = save.fields.name;
                recipe.steps = save.fields.steps;
                recipe.image = save.fields.image;
                recipe.updated_at = Utc::now().max(recipe.updated_at);
                recipe.clone()
            }
            None => self.insert_recipe(save.fields),
        };

        for write in save.ingredients {
            match write {
                IngredientWrite::Create(fields) => {
                    self.insert_ingredient(recipe.id, fields.name, fields.quantity, fields.unit)
                }
                IngredientWrite::Update(ingredient_id, fields) => {
                    let ingredient = self.owned_ingredient(recipe.id, ingredient_id)?;
                    ingredient.name = fields.name;
                    ingredient.quantity = fields.quantity;
                    ingredient.unit = fields.unit;
                }
                IngredientWrite::Delete(ingredient_id) => {
                    self.owned_ingredient(recipe.id, ingredient_id)?;
                    self.ingredients.remove(&ingredient_id);
                }
            }
        }

        Ok(recipe)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecipeStore for MemoryStore {
    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let state = self.lock()?;

        Ok(state
            .recipes
            .values()
            .sorted_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            .cloned()
            .collect_vec())
    }

    fn get_recipe(&self, id: i32) -> Result<Option<Recipe>, StoreError> {
        Ok(self.lock()?.recipes.get(&id).cloned())
    }

    fn list_ingredients(&self, recipe_id: i32) -> Result<Vec<Ingredient>, StoreError> {
        let state = self.lock()?;

        // BTreeMap keeps ids ascending, which is insertion order
        Ok(state
            .ingredients
            .values()
            .filter(|ingredient| ingredient.recipe_id == recipe_id)
            .cloned()
            .collect_vec())
    }

    fn save_recipe(&self, save: RecipeSave) -> Result<Recipe, StoreError> {
        let mut state = self.lock()?;

        let mut draft = state.clone();
        let recipe = draft.apply(save)?;
        *state = draft;

        Ok(recipe)
    }

    fn delete_recipe(&self, id: i32) -> Result<bool, StoreError> {
        let mut state = self.lock()?;

        if state.recipes.remove(&id).is_none() {
            return Ok(false);
        }
        state.ingredients.retain(|_, ingredient| ingredient.recipe_id != id);

        Ok(true)
    }

    fn replace_all(&self, imports: Vec<RecipeImport>) -> Result<ImportSummary, StoreError> {
        let mut state = self.lock()?;

        state.recipes.clear();
        state.ingredients.clear();

        let mut summary = ImportSummary::default();
        for import in imports {
            let recipe = state.insert_recipe(import.fields);
            summary.recipes += 1;

            for fields in import.ingredients {
                state.insert_ingredient(recipe.id, fields.name, fields.quantity, fields.unit);
                summary.ingredients += 1;
            }
        }

        Ok(summary)
    }
}
