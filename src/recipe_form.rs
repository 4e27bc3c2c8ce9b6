use crate::database::models::recipe::{Recipe, RecipeFields};
use crate::formset::rows::{MAX_TEXT_LENGTH, REQUIRED, TOO_LONG};
use crate::formset::wire::FormData;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFormErrors {
    pub name: Option<&'static str>,
    pub steps: Option<&'static str>,
    pub image: Option<&'static str>,
}

impl RecipeFormErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.steps.is_none() && self.image.is_none()
    }
}

/// Recipe-level fields of the edit page, kept as typed so they can be shown
/// again next to their errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeForm {
    pub name: String,
    pub steps: String,
    pub image: String,
    errors: Option<RecipeFormErrors>,
}

impl RecipeForm {
    pub fn unbound(recipe: Option<&Recipe>) -> Self {
        recipe
            .map(|recipe| Self {
                name: recipe.name.clone(),
                steps: recipe.steps.clone(),
                image: recipe.image.clone().unwrap_or_default(),
                errors: None,
            })
            .unwrap_or_default()
    }

    pub fn bind(data: &FormData) -> Self {
        let field = |name: &str| data.get(name).unwrap_or_default().to_owned();

        Self {
            name: field("name"),
            steps: field("steps"),
            image: field("image"),
            errors: None,
        }
    }

    pub fn validate(&mut self) -> bool {
        let errors = match self.clean() {
            Ok(_) => RecipeFormErrors::default(),
            Err(errors) => errors,
        };
        let valid = errors.is_empty();
        self.errors = Some(errors);

        valid
    }

    pub fn errors(&self) -> Option<&RecipeFormErrors> {
        self.errors.as_ref()
    }

    pub fn clean(&self) -> Result<RecipeFields, RecipeFormErrors> {
        let name = self.name.trim();
        let name_error = if name.is_empty() {
            Some(REQUIRED)
        } else if name.chars().count() > MAX_TEXT_LENGTH {
            Some(TOO_LONG)
        } else {
            None
        };

        let steps_error = self.steps.trim().is_empty().then_some(REQUIRED);

        let image = self.image.trim();
        let image_error = (image.chars().count() > MAX_TEXT_LENGTH).then_some(TOO_LONG);

        let errors = RecipeFormErrors {
            name: name_error,
            steps: steps_error,
            image: image_error,
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(RecipeFields::new(
            name.to_owned(),
            self.steps.replace("\r\n", "\n"),
            (!image.is_empty()).then(|| image.to_owned()),
        ))
    }
}
