use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::{delete, insert_into, update, PgConnection};
use itertools::Itertools;
use lombok::AllArgsConstructor;
use tracing::{debug, trace_span};

use super::recipe_store::{
    ImportSummary, IngredientWrite, RecipeImport, RecipeSave, RecipeStore, StoreError,
};
use crate::database::{
    connection::PgPool,
    models::{
        ingredient::{Ingredient, NewIngredient},
        recipe::{NewRecipe, Recipe, RecipeChangeset, RecipeFields},
    },
    schema::{ingredients, recipes},
};

#[derive(AllArgsConstructor)]
pub struct DatabaseStore {
    pool: PgPool,
}

impl RecipeStore for DatabaseStore {
    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut connection = self.pool.get()?;

        let result = recipes::table
            .select(Recipe::as_select())
            .order((recipes::created_at.desc(), recipes::id.desc()))
            .load(&mut connection)?;

        Ok(result)
    }

    fn get_recipe(&self, id: i32) -> Result<Option<Recipe>, StoreError> {
        let mut connection = self.pool.get()?;

        let result = recipes::table
            .find(id)
            .select(Recipe::as_select())
            .first(&mut connection)
            .optional()?;

        Ok(result)
    }

    fn list_ingredients(&self, recipe_id: i32) -> Result<Vec<Ingredient>, StoreError> {
        let mut connection = self.pool.get()?;

        let result = ingredients::table
            .filter(ingredients::recipe_id.eq(recipe_id))
            .order(ingredients::id.asc())
            .select(Ingredient::as_select())
            .load(&mut connection)?;

        Ok(result)
    }

    fn save_recipe(&self, save: RecipeSave) -> Result<Recipe, StoreError> {
        let span = trace_span!("save_recipe", recipe_id = ?save.recipe_id);
        let _guard = span.enter();

        let mut connection = self.pool.get()?;

        connection
            .build_transaction()
            .run(|connection| {
                let recipe = match save.recipe_id {
                    Some(id) => update_recipe(connection, id, save.fields)?,
                    None => insert_recipe(connection, save.fields)?,
                };

                for write in save.ingredients {
                    apply_ingredient_write(connection, recipe.id, write)?;
                }

                debug!(recipe_id = recipe.id, "recipe saved");
                Ok(recipe)
            })
    }

    fn delete_recipe(&self, id: i32) -> Result<bool, StoreError> {
        let mut connection = self.pool.get()?;

        // ingredients go with it through ON DELETE CASCADE
        let deleted = delete(recipes::table.find(id)).execute(&mut connection)?;

        Ok(deleted > 0)
    }

    fn replace_all(&self, imports: Vec<RecipeImport>) -> Result<ImportSummary, StoreError> {
        let span = trace_span!("replace_all", recipes = imports.len());
        let _guard = span.enter();

        let mut connection = self.pool.get()?;

        connection
            .build_transaction()
            .run(|connection| {
                delete(recipes::table).execute(connection)?;

                let mut summary = ImportSummary::default();
                for import in imports {
                    let recipe = insert_recipe(connection, import.fields)?;
                    summary.recipes += 1;

                    let new_ingredients = import
                        .ingredients
                        .into_iter()
                        .map(|fields| fields.into_new(recipe.id))
                        .collect_vec();

                    if !new_ingredients.is_empty() {
                        summary.ingredients += insert_into(ingredients::table)
                            .values(&new_ingredients)
                            .execute(connection)?;
                    }
                }

                Ok(summary)
            })
    }
}

fn insert_recipe(connection: &mut PgConnection, fields: RecipeFields) -> Result<Recipe, StoreError> {
    let now = Utc::now();
    let recipe = insert_into(recipes::table)
        .values(NewRecipe::new(fields.name, fields.steps, fields.image, now, now))
        .returning(Recipe::as_returning())
        .get_result(connection)?;

    Ok(recipe)
}

fn update_recipe(
    connection: &mut PgConnection,
    id: i32,
    fields: RecipeFields,
) -> Result<Recipe, StoreError> {
    let previous: DateTime<Utc> = recipes::table
        .find(id)
        .select(recipes::updated_at)
        .for_update()
        .first(connection)
        .optional()?
        .ok_or(StoreError::RecipeNotFound(id))?;

    let updated_at = Utc::now().max(previous);
    let recipe = update(recipes::table.find(id))
        .set(RecipeChangeset::new(
            fields.name,
            fields.steps,
            fields.image,
            updated_at,
        ))
        .returning(Recipe::as_returning())
        .get_result(connection)?;

    Ok(recipe)
}

fn apply_ingredient_write(
    connection: &mut PgConnection,
    recipe_id: i32,
    write: IngredientWrite,
) -> Result<(), StoreError> {
    let owned_by_recipe = |ingredient_id: i32| {
        ingredients::table
            .filter(ingredients::id.eq(ingredient_id))
            .filter(ingredients::recipe_id.eq(recipe_id))
    };

    let (ingredient_id, affected) = match write {
        IngredientWrite::Create(fields) => {
            let new_ingredient: NewIngredient = fields.into_new(recipe_id);
            insert_into(ingredients::table)
                .values(&new_ingredient)
                .execute(connection)?;
            return Ok(());
        }
        IngredientWrite::Update(ingredient_id, fields) => {
            let affected = update(owned_by_recipe(ingredient_id))
                .set(fields.into_changeset())
                .execute(connection)?;
            (ingredient_id, affected)
        }
        IngredientWrite::Delete(ingredient_id) => {
            let affected = delete(owned_by_recipe(ingredient_id)).execute(connection)?;
            (ingredient_id, affected)
        }
    };

    if affected == 0 {
        return Err(StoreError::ForeignIngredient {
            recipe_id,
            ingredient_id,
        });
    }

    Ok(())
}
