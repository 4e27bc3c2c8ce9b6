use super::escape;
use crate::database::models::recipe::Recipe;
use crate::portions::{format_quantity, ScaledIngredient};
use crate::workflow::RecipeDetail;

pub const INGREDIENT_LIST_ID: &str = "ingredient-list";

pub fn recipe_list(recipes: &[Recipe], can_create: bool) -> String {
    let mut html = String::from("<h1>Recipes</h1>\n");

    if can_create {
        html.push_str("<a href=\"/recipe/create/\">New recipe</a>\n");
    }

    if recipes.is_empty() {
        html.push_str("<p>No recipes yet.</p>\n");
        return html;
    }

    html.push_str("<ul class=\"recipes\">\n");
    for recipe in recipes {
        html.push_str(&format!(
            "<li><a href=\"/recipe/{id}/\">{name}</a> <time datetime=\"{created}\">{created_day}</time></li>\n",
            id = recipe.id,
            name = escape(&recipe.name),
            created = recipe.created_at.to_rfc3339(),
            created_day = recipe.created_at.format("%Y-%m-%d"),
        ));
    }
    html.push_str("</ul>\n");

    html
}

/// The `#ingredient-list` fragment, also sent on its own as a patch.
pub fn ingredient_list(ingredients: &[ScaledIngredient]) -> String {
    let mut html = format!("<ul id=\"{INGREDIENT_LIST_ID}\">\n");
    for ingredient in ingredients {
        html.push_str(&format!(
            "<li>{quantity} {unit} of {name}</li>\n",
            quantity = format_quantity(ingredient.quantity),
            unit = escape(&ingredient.unit),
            name = escape(&ingredient.name),
        ));
    }
    html.push_str("</ul>");

    html
}

pub fn recipe_detail(detail: &RecipeDetail) -> String {
    let recipe = &detail.recipe;
    let mut html = format!("<h1>{}</h1>\n", escape(&recipe.name));

    if let Some(image) = &recipe.image {
        html.push_str(&format!(
            "<img src=\"{src}\" alt=\"{alt}\">\n",
            src = escape(&image_url(image)),
            alt = escape(&recipe.name),
        ));
    }

    if detail.can_change {
        html.push_str(&format!("<a href=\"/recipe/{}/change/\">Edit</a>\n", recipe.id));
    }
    if detail.can_delete {
        html.push_str(&format!(
            "<button data-on-click=\"confirm('Delete this recipe?') && @delete('/recipe/{}/')\">Delete</button>\n",
            recipe.id,
        ));
    }

    html.push_str(&format!(
        r#"<section data-signals-portions="1">
<label>Portions <input type="number" min="0.5" step="0.5" data-bind-portions data-on-input__debounce.300ms="@get('/recipe/{id}/ingredients/')"></label>
<h2>Ingredients</h2>
"#,
        id = recipe.id,
    ));

    let unscaled = detail
        .ingredients
        .iter()
        .map(|ingredient| ScaledIngredient {
            name: ingredient.name.clone(),
            quantity: ingredient.quantity,
            unit: ingredient.unit.clone(),
        })
        .collect::<Vec<_>>();
    html.push_str(&ingredient_list(&unscaled));
    html.push_str("\n</section>\n<h2>Steps</h2>\n<ol class=\"steps\">\n");

    for step in recipe.step_lines() {
        html.push_str(&format!("<li>{}</li>\n", escape(step)));
    }
    html.push_str("</ol>\n");

    html
}

/// Absolute URLs are used as they are; anything else lives under `/media/`.
pub fn image_url(image: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        return image.to_owned();
    }

    format!("/media/{}", image.trim_start_matches('/'))
}
