use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, trace_span};

use crate::database::models::{ingredient::IngredientFields, recipe::RecipeFields};
use crate::store::{ImportSummary, RecipeImport, RecipeStore, StoreError};

pub const DEFAULT_IMPORT_PATH: &str = "recipes.json";

const SAMPLE_RECIPES: &str = include_str!("../resources/sample_recipes.json");

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Unable to read import file")]
    Io(#[from] std::io::Error),
    #[error("Invalid recipe JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid quantity for {ingredient:?} in {recipe:?}")]
    InvalidQuantity { recipe: String, ingredient: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Steps {
    Lines(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RecipeEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    steps: Option<Steps>,
    #[serde(default)]
    ingredients: Option<Vec<IngredientEntry>>,
}

#[derive(Debug, Deserialize)]
struct IngredientEntry {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    quantity: Option<Value>,
    #[serde(default)]
    unit: Option<Value>,
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_owned(),
        Some(other) => other.to_string(),
    }
}

/// Missing, null, zero, `false` and empty quantities all mean 0.
fn parse_quantity(value: Option<&Value>) -> Option<f64> {
    let quantity = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => 0.0,
        Some(Value::Bool(true)) => 1.0,
        Some(Value::Number(number)) => number.as_f64()?,
        Some(Value::String(text)) if text.trim().is_empty() => 0.0,
        Some(Value::String(text)) => text.trim().parse::<f64>().ok()?,
        Some(_) => return None,
    };

    (quantity.is_finite() && quantity >= 0.0).then_some(quantity)
}

impl RecipeEntry {
    fn into_import(self) -> Result<RecipeImport, ImportError> {
        let name = self.name.unwrap_or_default().trim().to_owned();
        let steps = match self.steps {
            Some(Steps::Lines(lines)) => lines.join("\n"),
            Some(Steps::Text(text)) => text,
            None => String::new(),
        };

        let ingredients = self
            .ingredients
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                let ingredient = text(entry.name.as_ref());
                let quantity = parse_quantity(entry.quantity.as_ref()).ok_or_else(|| {
                    ImportError::InvalidQuantity {
                        recipe: name.clone(),
                        ingredient: ingredient.clone(),
                    }
                })?;

                Ok(IngredientFields::new(ingredient, quantity, text(entry.unit.as_ref())))
            })
            .collect::<Result<Vec<_>, ImportError>>()?;

        Ok(RecipeImport::new(RecipeFields::new(name, steps, None), ingredients))
    }
}

pub fn parse_recipes(json: &str) -> Result<Vec<RecipeImport>, ImportError> {
    let entries: Vec<RecipeEntry> = serde_json::from_str(json)?;

    entries
        .into_iter()
        .map(RecipeEntry::into_import)
        .collect()
}

pub fn load_file(path: &Path) -> Result<Vec<RecipeImport>, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.to_owned()));
    }

    parse_recipes(&fs::read_to_string(path)?)
}

pub fn sample_recipes() -> Result<Vec<RecipeImport>, ImportError> {
    parse_recipes(SAMPLE_RECIPES)
}

/// Wipes the catalog and stores `recipes` in its place.
pub fn import(
    store: &dyn RecipeStore,
    recipes: Vec<RecipeImport>,
) -> Result<ImportSummary, ImportError> {
    let span = trace_span!("import", recipes = recipes.len());
    let _guard = span.enter();

    let summary = store.replace_all(recipes)?;
    info!(
        "Imported {} recipes and {} ingredients.",
        summary.recipes, summary.ingredients
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn parses_list_and_text_steps() {
        let recipes = parse_recipes(
            r#"[
                {"name": "  Tea ", "steps": ["Boil water", "Steep"], "ingredients": [
                    {"name": " water ", "quantity": 0.5, "unit": "l"},
                    {"name": "tea", "unit": "bag"}
                ]},
                {"name": "Toast", "steps": "Toast the bread"}
            ]"#,
        )
        .unwrap();

        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].fields.name, "Tea");
        assert_eq!(recipes[0].fields.steps, "Boil water\nSteep");
        assert_eq!(
            recipes[0].ingredients,
            vec![
                IngredientFields::new("water".to_owned(), 0.5, "l".to_owned()),
                IngredientFields::new("tea".to_owned(), 0.0, "bag".to_owned()),
            ]
        );
        assert_eq!(recipes[1].fields.steps, "Toast the bread");
        assert!(recipes[1].ingredients.is_empty());
    }

    #[test]
    fn rejects_unreadable_quantities() {
        let error = parse_recipes(
            r#"[{"name": "Soup", "ingredients": [{"name": "salt", "quantity": "a pinch"}]}]"#,
        )
        .unwrap_err();

        assert!(matches!(error, ImportError::InvalidQuantity { .. }));
        assert!(matches!(
            parse_recipes(r#"[{"name": "Soup", "ingredients": [{"quantity": -1}]}]"#),
            Err(ImportError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        assert!(matches!(load_file(&path), Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn import_replaces_the_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Tea", "steps": ["Boil"], "ingredients": [{{"name": "water", "quantity": 1, "unit": "cup"}}]}}]"#
        )
        .unwrap();
        let store = MemoryStore::new();
        import(&store, sample_recipes().unwrap()).unwrap();

        let summary = import(&store, load_file(file.path()).unwrap()).unwrap();

        assert_eq!(summary, ImportSummary::new(1, 1));
        let recipes = store.list_recipes().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Tea");
    }

    #[test]
    fn sample_recipes_are_valid() {
        let recipes = sample_recipes().unwrap();

        assert_eq!(recipes.len(), 4);
        assert!(recipes
            .iter()
            .all(|recipe| !recipe.fields.name.is_empty() && !recipe.ingredients.is_empty()));
    }
}
