use super::escape;
use crate::database::models::recipe::Recipe;
use crate::formset::rows::RowErrors;
use crate::formset::wire::{FORM_ACTION, INITIAL_FORMS, MAX_NUM_FORMS, MIN_NUM_FORMS, TOTAL_FORMS};
use crate::formset::{IngredientFormSet, MAX_ROWS, MIN_ROWS};
use crate::workflow::EditPage;

pub const INGREDIENT_SECTION_ID: &str = "ingredients-section";
pub const FORM_ACTION_URL: &str = "/recipe/create/add-ingredient-form/";

fn field_error(html: &mut String, error: Option<&str>) {
    if let Some(error) = error {
        html.push_str(&format!(r#"<span class="error">{}</span>"#, escape(error)));
    }
}

fn submit_url(recipe: Option<&Recipe>) -> String {
    match recipe {
        Some(recipe) => format!("/recipe/{}/change/", recipe.id),
        None => "/recipe/create/".to_owned(),
    }
}

pub fn edit_page(page: &EditPage) -> String {
    let form = &page.form;
    let errors = form.errors().cloned().unwrap_or_default();

    let mut html = match &page.recipe {
        Some(recipe) => format!("<h1>Edit {}</h1>\n", escape(&recipe.name)),
        None => "<h1>New recipe</h1>\n".to_owned(),
    };

    html.push_str(&format!(
        r#"<form method="post" action="{action}">
<input type="hidden" name="{FORM_ACTION}" value="">
<label>Name <input type="text" name="name" value="{name}" placeholder="Recipe name..."></label>"#,
        action = submit_url(page.recipe.as_ref()),
        name = escape(&form.name),
    ));
    field_error(&mut html, errors.name);

    html.push_str(&format!(
        r#"
<label>Image <input type="text" name="image" value="{image}" placeholder="recipes/picture.jpg"></label>"#,
        image = escape(&form.image),
    ));
    field_error(&mut html, errors.image);

    html.push_str(&format!(
        r#"
<label>Steps <textarea name="steps" rows="12" placeholder="Enter step-by-step instructions...">{steps}</textarea></label>"#,
        steps = escape(&form.steps),
    ));
    field_error(&mut html, errors.steps);

    html.push('\n');
    html.push_str(&ingredient_section(
        page.recipe.as_ref(),
        &page.formset,
    ));
    html.push_str("\n<button type=\"submit\">Save</button>\n</form>\n");

    html
}

/// The `#ingredients-section` fragment: management fields and one line per
/// row. Rows marked for deletion stay visible, struck through.
pub fn ingredient_section(recipe: Option<&Recipe>, formset: &IngredientFormSet) -> String {
    let mut html = format!("<div id=\"{INGREDIENT_SECTION_ID}\">\n<h2>Ingredients</h2>\n");

    if let Some(recipe) = recipe {
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"recipe_id\" value=\"{}\">\n",
            recipe.id
        ));
    }

    for (name, value) in [
        (TOTAL_FORMS, formset.total_forms()),
        (INITIAL_FORMS, formset.initial_forms()),
        (MIN_NUM_FORMS, MIN_ROWS),
        (MAX_NUM_FORMS, MAX_ROWS),
    ] {
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"{}\" value=\"{value}\">\n",
            escape(&formset.management_field(name)),
        ));
    }

    if let Some(errors) = formset.errors() {
        for error in &errors.non_row {
            html.push_str(&format!("<p class=\"error\">{}</p>\n", escape(error)));
        }
    }

    for (index, row) in formset.rows().iter().enumerate() {
        let errors = formset.row_errors(index).cloned().unwrap_or_default();
        let class = if row.delete { "row deleted" } else { "row" };
        let style = if row.delete {
            r#" style="text-decoration: line-through""#
        } else {
            ""
        };
        html.push_str(&format!(r#"<div class="{class}"{style}>"#));

        if let Some(id) = row.id {
            html.push_str(&format!(
                r#"<input type="hidden" name="{}" value="{id}">"#,
                escape(&formset.field_name(index, "id")),
            ));
        }
        field_error(&mut html, errors.id);

        row_input(&mut html, formset, index, "quantity", &row.quantity, &errors);
        row_input(&mut html, formset, index, "unit", &row.unit, &errors);
        row_input(&mut html, formset, index, "name", &row.name, &errors);

        if row.delete {
            html.push_str(&format!(
                r#"<input type="hidden" name="{}" value="on">"#,
                escape(&formset.field_name(index, "DELETE")),
            ));
        } else {
            html.push_str(&format!(
                r#"<button type="button" data-on-click="el.form.{FORM_ACTION}.value='remove:{target}'; @post('{FORM_ACTION_URL}', {{contentType: 'form'}})">Remove</button>"#,
                target = escape(&formset.row_prefix(index)),
            ));
        }
        html.push_str("</div>\n");
    }

    html.push_str(&format!(
        r#"<button type="button" data-on-click="el.form.{FORM_ACTION}.value='add_ingredient'; @post('{FORM_ACTION_URL}', {{contentType: 'form'}})">Add ingredient</button>
</div>"#
    ));

    html
}

fn row_input(
    html: &mut String,
    formset: &IngredientFormSet,
    index: usize,
    field: &str,
    value: &str,
    errors: &RowErrors,
) {
    let (kind, extra, error) = match field {
        "quantity" => ("number", r#" step="0.01" placeholder="0""#, errors.quantity),
        "unit" => ("text", r#" placeholder="Unit""#, errors.unit),
        _ => ("text", r#" placeholder="Ingredient name""#, errors.name),
    };

    html.push_str(&format!(
        r#"<input type="{kind}" name="{name}" value="{value}"{extra}>"#,
        name = escape(&formset.field_name(index, field)),
        value = escape(value),
    ));
    field_error(html, error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formset::wire::FormData;
    use crate::formset::DEFAULT_PREFIX;
    use crate::recipe_form::RecipeForm;

    #[test]
    fn section_carries_management_fields() {
        let formset = IngredientFormSet::unbound(DEFAULT_PREFIX, vec![]);

        let html = ingredient_section(None, &formset);

        assert!(html.starts_with(r#"<div id="ingredients-section">"#));
        assert!(html.contains(r#"name="ingredients-TOTAL_FORMS" value="1""#));
        assert!(html.contains(r#"name="ingredients-INITIAL_FORMS" value="0""#));
        assert!(html.contains(r#"name="ingredients-0-name" value="""#));
        assert!(!html.contains("recipe_id"));
    }

    #[test]
    fn deleted_rows_are_struck_through_and_keep_their_marker() {
        let data: FormData = [
            ("ingredients-TOTAL_FORMS", "2"),
            ("ingredients-0-name", "water"),
            ("ingredients-1-name", "tea"),
            ("ingredients-1-DELETE", "on"),
        ]
        .into_iter()
        .collect();
        let formset = IngredientFormSet::bind(DEFAULT_PREFIX, vec![], &data).unwrap();

        let html = ingredient_section(None, &formset);

        assert!(html.contains(r#"<div class="row deleted" style="text-decoration: line-through">"#));
        assert!(html.contains(r#"name="ingredients-1-DELETE" value="on""#));
        assert!(html.contains("remove:ingredients-0"));
        assert!(!html.contains("remove:ingredients-1"));
    }

    #[test]
    fn edit_page_shows_field_errors() {
        let data: FormData = [
            ("name", ""),
            ("steps", "Boil <water>"),
            ("ingredients-TOTAL_FORMS", "1"),
            ("ingredients-0-name", "water"),
            ("ingredients-0-quantity", "-1"),
            ("ingredients-0-unit", "cup"),
        ]
        .into_iter()
        .collect();
        let mut form = RecipeForm::bind(&data);
        form.validate();
        let mut formset = IngredientFormSet::bind(DEFAULT_PREFIX, vec![], &data).unwrap();
        formset.validate();

        let html = edit_page(&EditPage {
            recipe: None,
            form,
            formset,
        });

        assert!(html.contains(r#"action="/recipe/create/""#));
        assert!(html.contains("Boil &lt;water&gt;"));
        assert!(html.contains("This field is required."));
        assert!(html.contains("Ensure this value is greater than or equal to 0."));
    }
}
