use std::fmt;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Identifiable, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i32,
    pub name: String,
    pub steps: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for Recipe {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Recipe {}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Recipe {
    /// Non-blank instruction lines, in order.
    pub fn step_lines(&self) -> impl Iterator<Item = &str> {
        self.steps
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRecipe {
    pub name: String,
    pub steps: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(treat_none_as_null = true)]
pub struct RecipeChangeset {
    pub name: String,
    pub steps: String,
    pub image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Recipe-level values as submitted through the edit form or an import.
#[derive(AllArgsConstructor, Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeFields {
    pub name: String,
    pub steps: String,
    pub image: Option<String>,
}
