pub mod rows;
pub mod wire;

use std::collections::HashSet;

use itertools::Itertools;
use tracing::debug;

use crate::database::models::ingredient::{Ingredient, IngredientFields};
use crate::store::IngredientWrite;
use rows::{IngredientRow, RowErrors};
use wire::{
    management_key, parse_row_prefix, row_key, FormData, FormsetError, DELETE, INITIAL_FORMS,
    MAX_NUM_FORMS, MIN_NUM_FORMS, TOTAL_FORMS,
};

pub const DEFAULT_PREFIX: &str = "ingredients";
pub const MIN_ROWS: usize = 1;
pub const MAX_ROWS: usize = 1000;
pub const TOO_FEW_ROWS: &str = "Please submit at least 1 ingredient.";

/// Validation messages of a whole formset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormsetErrors {
    /// One entry per row, in row order.
    pub rows: Vec<RowErrors>,
    pub non_row: Vec<&'static str>,
}

impl FormsetErrors {
    pub fn is_empty(&self) -> bool {
        self.non_row.is_empty() && self.rows.iter().all(RowErrors::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RowOutcome {
    /// Untouched extra row, or a new row that was removed again.
    Skipped,
    Deleted(i32),
    Valid(Option<i32>, IngredientFields),
    Invalid(RowErrors),
    /// Repeats the id of an earlier row.
    Duplicate,
}

/// Rows are kept by index for the whole request. Removing a row only marks
/// it; the row stays in the set until the recipe is saved.
#[derive(Debug, Clone)]
pub struct IngredientFormSet {
    prefix: String,
    rows: Vec<IngredientRow>,
    existing: Vec<Ingredient>,
    errors: Option<FormsetErrors>,
}

impl IngredientFormSet {
    /// Rows for a fresh page: one per stored ingredient, or a single empty
    /// row when there are none yet.
    pub fn unbound(prefix: &str, existing: Vec<Ingredient>) -> Self {
        let mut rows = existing
            .iter()
            .map(IngredientRow::from_ingredient)
            .collect_vec();
        while rows.len() < MIN_ROWS {
            rows.push(IngredientRow::default());
        }

        Self {
            prefix: prefix.to_owned(),
            rows,
            existing,
            errors: None,
        }
    }

    pub fn bind(
        prefix: &str,
        existing: Vec<Ingredient>,
        data: &FormData,
    ) -> Result<Self, FormsetError> {
        let total = data
            .get(&management_key(prefix, TOTAL_FORMS))
            .ok_or(FormsetError::MissingManagementForm)?
            .trim()
            .parse::<usize>()
            .map_err(|_| FormsetError::InvalidCounts)?;

        if total > MAX_ROWS {
            return Err(FormsetError::TooManyRows);
        }

        let rows = (0..total)
            .map(|index| IngredientRow::from_data(prefix, index, data))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(prefix, total, "formset bound");

        Ok(Self {
            prefix: prefix.to_owned(),
            rows,
            existing,
            errors: None,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn rows(&self) -> &[IngredientRow] {
        &self.rows
    }

    pub fn total_forms(&self) -> usize {
        self.rows.len()
    }

    pub fn initial_forms(&self) -> usize {
        self.rows.iter().filter(|row| row.id.is_some()).count()
    }

    pub fn row_prefix(&self, index: usize) -> String {
        wire::row_prefix(&self.prefix, index)
    }

    pub fn field_name(&self, index: usize, field: &str) -> String {
        row_key(&self.prefix, index, field)
    }

    pub fn management_field(&self, name: &str) -> String {
        management_key(&self.prefix, name)
    }

    /// Appends an empty row. Existing rows are left as they are.
    pub fn add_row(&mut self) -> Result<(), FormsetError> {
        if self.rows.len() >= MAX_ROWS {
            return Err(FormsetError::TooManyRows);
        }
        self.rows.push(IngredientRow::default());
        self.errors = None;

        Ok(())
    }

    /// Marks the row addressed by `target` (`{prefix}-{index}`) as deleted.
    pub fn remove_row(&mut self, target: &str) -> Result<(), FormsetError> {
        let index = parse_row_prefix(&self.prefix, target)?;
        let row = self.rows.get_mut(index).ok_or(FormsetError::UnknownRow)?;
        row.delete = true;
        self.errors = None;

        Ok(())
    }

    /// Validates every row and remembers the messages for rendering.
    pub fn validate(&mut self) -> bool {
        let (_, errors) = self.check();
        let valid = errors.is_empty();
        self.errors = Some(errors);

        valid
    }

    pub fn errors(&self) -> Option<&FormsetErrors> {
        self.errors.as_ref()
    }

    pub fn row_errors(&self, index: usize) -> Option<&RowErrors> {
        self.errors.as_ref().and_then(|errors| errors.rows.get(index))
    }

    /// The ingredient writes that make the store match the submitted rows.
    ///
    /// Fails with the validation messages when any row is invalid or no row
    /// survives.
    pub fn save_plan(&self) -> Result<Vec<IngredientWrite>, FormsetErrors> {
        let (outcomes, errors) = self.check();
        if !errors.is_empty() {
            return Err(errors);
        }

        let writes = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                RowOutcome::Deleted(id) => Some(IngredientWrite::Delete(id)),
                RowOutcome::Valid(None, fields) => Some(IngredientWrite::Create(fields)),
                RowOutcome::Valid(Some(id), fields) => {
                    let unchanged = self
                        .existing_ingredient(id)
                        .is_some_and(|ingredient| ingredient.fields() == fields);
                    (!unchanged).then_some(IngredientWrite::Update(id, fields))
                }
                RowOutcome::Skipped | RowOutcome::Invalid(_) | RowOutcome::Duplicate => None,
            })
            .collect_vec();

        Ok(writes)
    }

    /// Flat field encoding of the current rows.
    pub fn to_fields(&self) -> FormData {
        let mut fields = vec![
            (self.management_field(TOTAL_FORMS), self.total_forms().to_string()),
            (self.management_field(INITIAL_FORMS), self.initial_forms().to_string()),
            (self.management_field(MIN_NUM_FORMS), MIN_ROWS.to_string()),
            (self.management_field(MAX_NUM_FORMS), MAX_ROWS.to_string()),
        ];

        for (index, row) in self.rows.iter().enumerate() {
            if let Some(id) = row.id {
                fields.push((self.field_name(index, "id"), id.to_string()));
            }
            fields.push((self.field_name(index, "name"), row.name.clone()));
            fields.push((self.field_name(index, "quantity"), row.quantity.clone()));
            fields.push((self.field_name(index, "unit"), row.unit.clone()));
            if row.delete {
                fields.push((self.field_name(index, DELETE), "on".to_owned()));
            }
        }

        FormData::new(fields)
    }

    fn existing_ingredient(&self, id: i32) -> Option<&Ingredient> {
        self.existing.iter().find(|ingredient| ingredient.id == id)
    }

    fn outcome(&self, index: usize, row: &IngredientRow) -> RowOutcome {
        let known_id = row.id.filter(|id| self.existing_ingredient(*id).is_some());

        if row.delete {
            return known_id.map_or(RowOutcome::Skipped, RowOutcome::Deleted);
        }

        if row.id.is_some() && known_id.is_none() {
            return RowOutcome::Invalid(RowErrors::unknown_ingredient());
        }

        if row.id.is_none() && index >= MIN_ROWS && !row.has_input() {
            return RowOutcome::Skipped;
        }

        match row.clean() {
            Ok(fields) => RowOutcome::Valid(row.id, fields),
            Err(errors) => RowOutcome::Invalid(errors),
        }
    }

    fn check(&self) -> (Vec<RowOutcome>, FormsetErrors) {
        let mut seen = HashSet::new();
        let outcomes = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| match row.id {
                // A stored ingredient may be addressed by one row only.
                Some(id) if !seen.insert(id) => RowOutcome::Duplicate,
                _ => self.outcome(index, row),
            })
            .collect_vec();

        let rows = outcomes
            .iter()
            .map(|outcome| match outcome {
                RowOutcome::Invalid(errors) => errors.clone(),
                RowOutcome::Duplicate => RowErrors::duplicate(),
                _ => RowErrors::default(),
            })
            .collect_vec();

        let survivors = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, RowOutcome::Valid(..) | RowOutcome::Invalid(_)))
            .count();

        let mut non_row = Vec::new();
        if survivors < MIN_ROWS {
            non_row.push(TOO_FEW_ROWS);
        }

        (outcomes, FormsetErrors { rows, non_row })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(id: i32, name: &str, quantity: f64, unit: &str) -> Ingredient {
        Ingredient::new(id, 1, name.to_owned(), quantity, unit.to_owned())
    }

    fn stored() -> Vec<Ingredient> {
        vec![
            ingredient(10, "flour", 200.0, "g"),
            ingredient(11, "milk", 0.5, "l"),
            ingredient(12, "egg", 2.0, "pcs"),
        ]
    }

    fn submitted(rows: &[(Option<i32>, &str, &str, &str)]) -> FormData {
        let mut fields = vec![("form-TOTAL_FORMS".to_owned(), rows.len().to_string())];
        for (index, (id, name, quantity, unit)) in rows.iter().enumerate() {
            if let Some(id) = id {
                fields.push((format!("form-{index}-id"), id.to_string()));
            }
            fields.push((format!("form-{index}-name"), (*name).to_owned()));
            fields.push((format!("form-{index}-quantity"), (*quantity).to_owned()));
            fields.push((format!("form-{index}-unit"), (*unit).to_owned()));
        }
        FormData::new(fields)
    }

    fn fields(name: &str, quantity: f64, unit: &str) -> IngredientFields {
        IngredientFields::new(name.to_owned(), quantity, unit.to_owned())
    }

    #[test]
    fn unbound_new_recipe_has_one_empty_row() {
        let formset = IngredientFormSet::unbound(DEFAULT_PREFIX, vec![]);

        assert_eq!(formset.total_forms(), 1);
        assert_eq!(formset.rows()[0], IngredientRow::default());
        assert_eq!(formset.initial_forms(), 0);
    }

    #[test]
    fn unbound_existing_recipe_shows_stored_rows() {
        let formset = IngredientFormSet::unbound(DEFAULT_PREFIX, stored());

        assert_eq!(formset.total_forms(), 3);
        assert_eq!(formset.initial_forms(), 3);
        assert_eq!(formset.rows()[1].quantity, "0.5");
        assert_eq!(formset.rows()[0].quantity, "200");
    }

    #[test]
    fn binding_requires_the_management_count() {
        let mut data = submitted(&[(None, "water", "1", "cup")]);
        data.set("form-TOTAL_FORMS", "two");
        assert_eq!(
            IngredientFormSet::bind("form", vec![], &data).unwrap_err(),
            FormsetError::InvalidCounts
        );

        let data: FormData = [("form-0-name", "water")].into_iter().collect();
        assert_eq!(
            IngredientFormSet::bind("form", vec![], &data).unwrap_err(),
            FormsetError::MissingManagementForm
        );

        let data: FormData = [("form-TOTAL_FORMS", "1001")].into_iter().collect();
        assert_eq!(
            IngredientFormSet::bind("form", vec![], &data).unwrap_err(),
            FormsetError::TooManyRows
        );
    }

    #[test]
    fn add_row_grows_total_by_one_and_keeps_rows() {
        let data = submitted(&[(None, "water", "1", "cup"), (None, "tea", "2", "bags")]);
        let mut formset = IngredientFormSet::bind("form", vec![], &data).unwrap();
        let before = formset.rows().to_vec();

        formset.add_row().unwrap();

        assert_eq!(formset.total_forms(), 3);
        assert_eq!(&formset.rows()[..2], before.as_slice());
        assert_eq!(formset.rows()[2], IngredientRow::default());
        assert_eq!(formset.to_fields().get("form-TOTAL_FORMS"), Some("3"));
    }

    #[test]
    fn remove_row_only_sets_the_marker() {
        let data = submitted(&[
            (None, "water", "1", "cup"),
            (None, "tea", "2", "bags"),
            (None, "sugar", "1", "tsp"),
        ]);
        let mut formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        formset.remove_row("form-1").unwrap();

        assert_eq!(formset.total_forms(), 3);
        assert!(formset.rows()[1].delete);
        assert!(!formset.rows()[0].delete && !formset.rows()[2].delete);
        assert_eq!(formset.to_fields().get("form-1-DELETE"), Some("on"));
        assert_eq!(formset.to_fields().get("form-TOTAL_FORMS"), Some("3"));
    }

    #[test]
    fn removing_unknown_rows_fails() {
        let data = submitted(&[(None, "water", "1", "cup")]);
        let mut formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        assert_eq!(formset.remove_row("form-5"), Err(FormsetError::UnknownRow));
        assert_eq!(formset.remove_row("other-0"), Err(FormsetError::UnknownRow));
    }

    #[test]
    fn removed_rows_are_not_persisted() {
        let mut data = submitted(&[
            (None, "water", "1", "cup"),
            (None, "tea", "2", "bags"),
            (None, "sugar", "1", "tsp"),
        ]);
        data.set("form-1-DELETE", "on");
        let formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        let plan = formset.save_plan().unwrap();

        assert_eq!(
            plan,
            vec![
                IngredientWrite::Create(fields("water", 1.0, "cup")),
                IngredientWrite::Create(fields("sugar", 1.0, "tsp")),
            ]
        );
    }

    #[test]
    fn reconciles_existing_rows() {
        let mut data = submitted(&[
            (Some(10), "flour", "200", "g"),
            (Some(11), "oat milk", "0.5", "l"),
            (Some(12), "egg", "2", "pcs"),
            (None, "salt", "1", "pinch"),
        ]);
        data.set("form-2-DELETE", "on");
        let formset = IngredientFormSet::bind("form", stored(), &data).unwrap();

        let plan = formset.save_plan().unwrap();

        assert_eq!(
            plan,
            vec![
                IngredientWrite::Update(11, fields("oat milk", 0.5, "l")),
                IngredientWrite::Delete(12),
                IngredientWrite::Create(fields("salt", 1.0, "pinch")),
            ]
        );
    }

    #[test]
    fn untouched_extra_rows_are_ignored() {
        let data = submitted(&[(None, "water", "1", "cup"), (None, "", "", "")]);
        let mut formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        assert!(formset.validate());
        assert_eq!(formset.save_plan().unwrap().len(), 1);
    }

    #[test]
    fn first_row_of_a_new_recipe_is_required() {
        let data = submitted(&[(None, "", "", "")]);
        let mut formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        assert!(!formset.validate());
        let errors = formset.row_errors(0).unwrap();
        assert_eq!(errors.name, Some(rows::REQUIRED));
        assert_eq!(errors.quantity, Some(rows::REQUIRED));
    }

    #[test]
    fn invalid_rows_block_the_whole_save() {
        let data = submitted(&[(None, "water", "1", "cup"), (None, "tea", "-2", "")]);
        let mut formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        assert!(!formset.validate());
        let errors = formset.save_plan().unwrap_err();
        assert!(errors.rows[0].is_empty());
        assert_eq!(errors.rows[1].quantity, Some(rows::NEGATIVE));
        assert_eq!(errors.rows[1].unit, Some(rows::REQUIRED));
    }

    #[test]
    fn deleted_rows_skip_validation() {
        let mut data = submitted(&[(None, "water", "1", "cup"), (None, "", "-5", "")]);
        data.set("form-1-DELETE", "on");
        let mut formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        assert!(formset.validate());
    }

    #[test]
    fn at_least_one_row_must_survive() {
        let mut data = submitted(&[(Some(10), "flour", "200", "g"), (Some(11), "milk", "0.5", "l")]);
        data.set("form-0-DELETE", "on");
        data.set("form-1-DELETE", "on");
        let mut formset = IngredientFormSet::bind("form", stored(), &data).unwrap();

        assert!(!formset.validate());
        assert_eq!(formset.errors().unwrap().non_row, vec![TOO_FEW_ROWS]);
        assert!(formset.save_plan().is_err());
    }

    #[test]
    fn zero_rows_is_invalid() {
        let data: FormData = [("form-TOTAL_FORMS", "0")].into_iter().collect();
        let formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        assert_eq!(formset.save_plan().unwrap_err().non_row, vec![TOO_FEW_ROWS]);
    }

    #[test]
    fn ids_of_other_recipes_are_rejected() {
        let data = submitted(&[(Some(99), "flour", "200", "g")]);
        let mut formset = IngredientFormSet::bind("form", stored(), &data).unwrap();

        assert!(!formset.validate());
        assert_eq!(
            formset.row_errors(0).unwrap().id,
            Some(rows::UNKNOWN_INGREDIENT)
        );
    }

    #[test]
    fn repeated_ids_are_rejected() {
        let mut data = submitted(&[(Some(10), "flour", "200", "g"), (Some(10), "flour", "200", "g")]);
        data.set("form-0-DELETE", "on");
        let mut formset = IngredientFormSet::bind("form", stored(), &data).unwrap();

        assert!(!formset.validate());
        assert!(formset.row_errors(0).unwrap().is_empty());
        assert_eq!(formset.row_errors(1).unwrap().id, Some(rows::DUPLICATE));
        assert!(formset.save_plan().is_err());

        let mut data = submitted(&[(Some(10), "flour", "200", "g"), (Some(10), "rye", "50", "g")]);
        data.set("form-0-DELETE", "on");
        data.set("form-1-DELETE", "on");
        let formset = IngredientFormSet::bind("form", stored(), &data).unwrap();

        let errors = formset.save_plan().unwrap_err();
        assert_eq!(errors.rows[1].id, Some(rows::DUPLICATE));
        assert_eq!(errors.non_row, vec![TOO_FEW_ROWS]);
    }

    #[test]
    fn add_row_stops_at_the_row_limit() {
        let total = MAX_ROWS.to_string();
        let data: FormData = [("form-TOTAL_FORMS", total.as_str())].into_iter().collect();
        let mut formset = IngredientFormSet::bind("form", vec![], &data).unwrap();

        assert_eq!(formset.add_row(), Err(FormsetError::TooManyRows));
        assert_eq!(formset.total_forms(), MAX_ROWS);
    }

    #[test]
    fn rebinding_rendered_fields_round_trips() {
        let mut formset = IngredientFormSet::unbound("form", stored());
        formset.remove_row("form-0").unwrap();
        formset.add_row().unwrap();

        let rebound = IngredientFormSet::bind("form", stored(), &formset.to_fields()).unwrap();

        assert_eq!(rebound.rows(), formset.rows());
    }
}
