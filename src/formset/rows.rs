use lombok::AllArgsConstructor;

use super::wire::{is_truthy, row_key, FormData, FormsetError, DELETE};
use crate::database::models::ingredient::{Ingredient, IngredientFields};

pub const MAX_TEXT_LENGTH: usize = 255;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_A_NUMBER: &str = "Enter a number.";
pub const NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";
pub const TOO_LONG: &str = "Ensure this value has at most 255 characters.";
pub const UNKNOWN_INGREDIENT: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const DUPLICATE: &str = "Please correct the duplicate data.";

/// One ingredient row exactly as submitted, so it can be shown again.
#[derive(AllArgsConstructor, Debug, Clone, Default, PartialEq)]
pub struct IngredientRow {
    pub id: Option<i32>,
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub delete: bool,
}

impl IngredientRow {
    pub fn from_ingredient(ingredient: &Ingredient) -> Self {
        Self::new(
            Some(ingredient.id),
            ingredient.name.clone(),
            ingredient.quantity.to_string(),
            ingredient.unit.clone(),
            false,
        )
    }

    pub fn from_data(prefix: &str, index: usize, data: &FormData) -> Result<Self, FormsetError> {
        let field = |name: &str| {
            data.get(&row_key(prefix, index, name))
                .unwrap_or_default()
                .to_owned()
        };

        let id = match data.get(&row_key(prefix, index, "id")).map(str::trim) {
            None | Some("") => None,
            Some(id) => Some(id.parse::<i32>().map_err(|_| FormsetError::InvalidRowId)?),
        };

        Ok(Self::new(
            id,
            field("name"),
            field("quantity"),
            field("unit"),
            is_truthy(data.get(&row_key(prefix, index, DELETE))),
        ))
    }

    /// Whether the user typed anything into the row.
    pub fn has_input(&self) -> bool {
        [&self.name, &self.quantity, &self.unit]
            .iter()
            .any(|value| !value.trim().is_empty())
    }

    pub fn clean(&self) -> Result<IngredientFields, RowErrors> {
        let name = clean_text(&self.name);
        let quantity = clean_quantity(&self.quantity);
        let unit = clean_text(&self.unit);

        match (name, quantity, unit) {
            (Ok(name), Ok(quantity), Ok(unit)) => Ok(IngredientFields::new(name, quantity, unit)),
            (name, quantity, unit) => Err(RowErrors {
                id: None,
                name: name.err(),
                quantity: quantity.err(),
                unit: unit.err(),
            }),
        }
    }
}

/// Per-field messages of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowErrors {
    pub id: Option<&'static str>,
    pub name: Option<&'static str>,
    pub quantity: Option<&'static str>,
    pub unit: Option<&'static str>,
}

impl RowErrors {
    pub fn unknown_ingredient() -> Self {
        Self {
            id: Some(UNKNOWN_INGREDIENT),
            ..Self::default()
        }
    }

    pub fn duplicate() -> Self {
        Self {
            id: Some(DUPLICATE),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.quantity.is_none() && self.unit.is_none()
    }
}

fn clean_text(raw: &str) -> Result<String, &'static str> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(REQUIRED);
    }
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(TOO_LONG);
    }

    Ok(value.to_owned())
}

fn clean_quantity(raw: &str) -> Result<f64, &'static str> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(REQUIRED);
    }

    let quantity = value
        .parse::<f64>()
        .ok()
        .filter(|quantity| quantity.is_finite())
        .ok_or(NOT_A_NUMBER)?;

    if quantity < 0.0 {
        return Err(NEGATIVE);
    }

    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, quantity: &str, unit: &str) -> IngredientRow {
        IngredientRow::new(None, name.to_owned(), quantity.to_owned(), unit.to_owned(), false)
    }

    #[test]
    fn cleans_trimmed_values() {
        let fields = row("  water ", " 1.5 ", "cup").clean().unwrap();

        assert_eq!(fields, IngredientFields::new("water".to_owned(), 1.5, "cup".to_owned()));
    }

    #[test]
    fn reports_every_bad_field() {
        let errors = row("", "-1", " ").clean().unwrap_err();

        assert_eq!(errors.name, Some(REQUIRED));
        assert_eq!(errors.quantity, Some(NEGATIVE));
        assert_eq!(errors.unit, Some(REQUIRED));
    }

    #[test]
    fn rejects_non_numbers() {
        for quantity in ["abc", "NaN", "inf", "1,5"] {
            let errors = row("salt", quantity, "g").clean().unwrap_err();
            assert_eq!(errors.quantity, Some(NOT_A_NUMBER), "{quantity}");
        }
    }

    #[test]
    fn zero_is_a_valid_quantity() {
        assert!(row("salt", "0", "pinch").clean().is_ok());
    }

    #[test]
    fn long_names_are_rejected() {
        let errors = row(&"a".repeat(256), "1", "g").clean().unwrap_err();

        assert_eq!(errors.name, Some(TOO_LONG));
    }

    #[test]
    fn reads_row_fields_from_flat_data() {
        let data: FormData = [
            ("form-1-id", "7"),
            ("form-1-name", "salt"),
            ("form-1-quantity", "2"),
            ("form-1-unit", "g"),
            ("form-1-DELETE", "on"),
        ]
        .into_iter()
        .collect();

        let parsed = IngredientRow::from_data("form", 1, &data).unwrap();

        assert_eq!(
            parsed,
            IngredientRow::new(Some(7), "salt".to_owned(), "2".to_owned(), "g".to_owned(), true)
        );
    }

    #[test]
    fn garbage_id_is_malformed() {
        let data: FormData = [("form-0-id", "seven")].into_iter().collect();

        assert_eq!(
            IngredientRow::from_data("form", 0, &data),
            Err(FormsetError::InvalidRowId)
        );
    }
}
