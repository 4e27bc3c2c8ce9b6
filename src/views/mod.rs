pub mod forms;
pub mod recipes;

use itertools::Itertools;

pub const DATASTAR_SCRIPT: &str =
    "https://cdn.jsdelivr.net/gh/starfederation/datastar@1.0.0-RC.5/bundles/datastar.js";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(character),
        }
    }
    escaped
}

/// Wraps a page body with the shared head, navigation and language switch.
pub fn layout(language: &str, languages: &[String], title: &str, body: &str) -> String {
    let options = languages
        .iter()
        .map(|code| {
            let selected = if code == language { " selected" } else { "" };
            format!(
                r#"<option value="{code}"{selected}>{code}</option>"#,
                code = escape(code),
            )
        })
        .join("");

    format!(
        r#"<!DOCTYPE html>
<html lang="{language}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<script type="module" src="{DATASTAR_SCRIPT}"></script>
</head>
<body>
<nav>
<a href="/">Recipes</a>
<form method="post" action="/set_language/">
<select name="language" onchange="this.form.submit()">{options}</select>
</form>
</nav>
<main>
{body}
</main>
</body>
</html>
"#,
        language = escape(language),
        title = escape(title),
    )
}
