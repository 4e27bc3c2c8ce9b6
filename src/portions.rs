use itertools::Itertools;
use serde_json::Value;

use crate::database::models::ingredient::Ingredient;

pub const DEFAULT_MULTIPLIER: f64 = 1.0;
pub const MIN_MULTIPLIER: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ScaledIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Turns the raw `portions` signal into a usable multiplier.
///
/// Absent, non-numeric and non-finite values fall back to 1.0, then the
/// result is clamped to at least 0.5. There is no upper bound.
pub fn normalize_multiplier(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|multiplier| multiplier.is_finite())
        .unwrap_or(DEFAULT_MULTIPLIER)
        .max(MIN_MULTIPLIER)
}

pub fn scale(ingredients: &[Ingredient], multiplier: f64) -> Vec<ScaledIngredient> {
    ingredients
        .iter()
        .map(|ingredient| ScaledIngredient {
            name: ingredient.name.clone(),
            quantity: ingredient.quantity * multiplier,
            unit: ingredient.unit.clone(),
        })
        .collect_vec()
}

/// Renders a quantity the way a cook would write it: no trailing zeros,
/// at most two decimals.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        return format!("{}", quantity as i64);
    }

    let text = format!("{:.2}", quantity);
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ingredient(name: &str, quantity: f64, unit: &str) -> Ingredient {
        Ingredient::new(1, 1, name.to_owned(), quantity, unit.to_owned())
    }

    #[test]
    fn scales_every_quantity_and_keeps_order() {
        let base = vec![ingredient("flour", 2.25, "cups"), ingredient("salt", 1.0, "tsp")];

        let scaled = scale(&base, 2.0);

        assert_eq!(scaled.len(), 2);
        assert_eq!(scaled[0].name, "flour");
        assert_eq!(scaled[0].unit, "cups");
        assert!((scaled[0].quantity - 4.5).abs() < f64::EPSILON);
        assert_eq!(scaled[1].name, "salt");
        assert!((scaled[1].quantity - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_list_scales_to_empty() {
        assert!(scale(&[], 3.0).is_empty());
    }

    #[test]
    fn product_holds_for_a_range_of_inputs() {
        for quantity in [0.0, 0.25, 1.0, 7.5, 400.0] {
            for multiplier in [0.5, 1.0, 1.5, 3.0, 12.0] {
                let scaled = scale(&[ingredient("x", quantity, "g")], multiplier);
                assert!((scaled[0].quantity - quantity * multiplier).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn invalid_signals_fall_back_to_one() {
        assert_eq!(normalize_multiplier(None), 1.0);
        assert_eq!(normalize_multiplier(Some(&json!("abc"))), 1.0);
        assert_eq!(normalize_multiplier(Some(&json!("NaN"))), 1.0);
        assert_eq!(normalize_multiplier(Some(&json!("inf"))), 1.0);
        assert_eq!(normalize_multiplier(Some(&json!("-infinity"))), 1.0);
        assert_eq!(normalize_multiplier(Some(&json!(null))), 1.0);
        assert_eq!(normalize_multiplier(Some(&json!([2]))), 1.0);
    }

    #[test]
    fn small_and_negative_multipliers_clamp_to_half() {
        assert_eq!(normalize_multiplier(Some(&json!(0.1))), 0.5);
        assert_eq!(normalize_multiplier(Some(&json!(0))), 0.5);
        assert_eq!(normalize_multiplier(Some(&json!(-4))), 0.5);
    }

    #[test]
    fn numeric_strings_and_large_values_pass_through() {
        assert_eq!(normalize_multiplier(Some(&json!("3"))), 3.0);
        assert_eq!(normalize_multiplier(Some(&json!(250))), 250.0);
    }

    #[test]
    fn formats_quantities_compactly() {
        assert_eq!(format_quantity(6.0), "6");
        assert_eq!(format_quantity(0.5), "0.5");
        assert_eq!(format_quantity(2.25), "2.25");
        assert_eq!(format_quantity(1.0 / 3.0), "0.33");
    }
}
