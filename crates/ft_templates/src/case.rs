//! Case conversions used by token filters and the scaffold generator.

/// Convert to snake_case. `BlogPost` and `blog-post` both become `blog_post`.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_lower = false;
        } else if c == '-' || c == ' ' || c == '_' {
            if !result.ends_with('_') && !result.is_empty() {
                result.push('_');
            }
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    result
}

/// Convert to PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// Convert to kebab-case.
pub fn to_kebab_case(s: &str) -> String {
    to_snake_case(s).replace('_', "-")
}

/// Lowercase and turn spaces and hyphens into underscores, leaving the rest as is.
///
/// `My Flask App` becomes `my_flask_app`, `TestProject` becomes `testproject`.
pub fn to_slug(s: &str) -> String {
    s.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Capitalize each whitespace/underscore separated word.
pub fn to_title_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
