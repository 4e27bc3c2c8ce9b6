use itertools::Itertools;
use thiserror::Error;

pub const TOTAL_FORMS: &str = "TOTAL_FORMS";
pub const INITIAL_FORMS: &str = "INITIAL_FORMS";
pub const MIN_NUM_FORMS: &str = "MIN_NUM_FORMS";
pub const MAX_NUM_FORMS: &str = "MAX_NUM_FORMS";
pub const DELETE: &str = "DELETE";

pub const FORM_ACTION: &str = "form_action";
const ADD_ACTION: &str = "add_ingredient";
const REMOVE_ACTION: &str = "remove:";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormsetError {
    #[error("Missing management form data.")]
    MissingManagementForm,
    #[error("Ambiguous management form data.")]
    AmbiguousManagementForm,
    #[error("Invalid management form counts.")]
    InvalidCounts,
    #[error("Too many ingredient rows.")]
    TooManyRows,
    #[error("Invalid ingredient id.")]
    InvalidRowId,
    #[error("Missing form action.")]
    MissingAction,
    #[error("Unknown form action.")]
    UnknownAction,
    #[error("Unknown ingredient row.")]
    UnknownRow,
}

/// A submitted form body. Keeps submission order; the last value of a
/// repeated key wins on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.fields.retain(|(name, _)| name != key);
        self.fields.push((key.to_owned(), value.to_owned()));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(fields: Vec<(String, String)>) -> Self {
        Self::new(fields)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for FormData {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
        )
    }
}

pub fn management_key(prefix: &str, name: &str) -> String {
    format!("{prefix}-{name}")
}

pub fn row_prefix(prefix: &str, index: usize) -> String {
    format!("{prefix}-{index}")
}

pub fn row_key(prefix: &str, index: usize, field: &str) -> String {
    format!("{prefix}-{index}-{field}")
}

/// Finds the formset prefix from the single `*-TOTAL_FORMS` key of a body.
pub fn discover_prefix(data: &FormData) -> Result<String, FormsetError> {
    let suffix = format!("-{TOTAL_FORMS}");

    let prefixes = data
        .keys()
        .filter_map(|key| key.strip_suffix(suffix.as_str()))
        .unique()
        .collect_vec();

    match prefixes.as_slice() {
        [] => Err(FormsetError::MissingManagementForm),
        [prefix] => Ok((*prefix).to_owned()),
        _ => Err(FormsetError::AmbiguousManagementForm),
    }
}

/// Checkbox semantics: blank and `false` are off, anything else is on.
pub fn is_truthy(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(value) => !value.eq_ignore_ascii_case("false"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    AddRow,
    /// Carries the row prefix, e.g. `ingredients-1`.
    RemoveRow(String),
}

impl FormAction {
    pub fn from_data(data: &FormData) -> Result<Self, FormsetError> {
        let action = data
            .get(FORM_ACTION)
            .filter(|action| !action.is_empty())
            .ok_or(FormsetError::MissingAction)?;

        if action == ADD_ACTION {
            return Ok(Self::AddRow);
        }

        action
            .strip_prefix(REMOVE_ACTION)
            .map(|target| Self::RemoveRow(target.to_owned()))
            .ok_or(FormsetError::UnknownAction)
    }
}

/// Index of the row addressed by `target` (`{prefix}-{index}`).
pub fn parse_row_prefix(prefix: &str, target: &str) -> Result<usize, FormsetError> {
    target
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|index| index.parse::<usize>().ok())
        .ok_or(FormsetError::UnknownRow)
}
