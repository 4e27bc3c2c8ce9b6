use std::fmt;

use diesel::prelude::*;
use lombok::AllArgsConstructor;

use super::recipe::Recipe;
use crate::portions::format_quantity;

#[derive(
    Queryable, Selectable, Identifiable, Associations, AllArgsConstructor, Debug, Clone, PartialEq,
)]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = crate::database::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ingredient {
    pub id: i32,
    pub recipe_id: i32,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} of {}",
            format_quantity(self.quantity),
            self.unit,
            self.name
        )
    }
}

impl Ingredient {
    pub fn fields(&self) -> IngredientFields {
        IngredientFields::new(self.name.clone(), self.quantity, self.unit.clone())
    }
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewIngredient {
    pub recipe_id: i32,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct IngredientChangeset {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Validated ingredient values, not yet bound to a stored row.
#[derive(AllArgsConstructor, Debug, Clone, PartialEq)]
pub struct IngredientFields {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl IngredientFields {
    pub fn into_new(self, recipe_id: i32) -> NewIngredient {
        NewIngredient::new(recipe_id, self.name, self.quantity, self.unit)
    }

    pub fn into_changeset(self) -> IngredientChangeset {
        IngredientChangeset {
            name: self.name,
            quantity: self.quantity,
            unit: self.unit,
        }
    }
}
