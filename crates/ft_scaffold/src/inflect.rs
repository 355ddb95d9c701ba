//! English pluralization for table and blueprint names.

const IRREGULAR: [(&str, &str); 8] = [
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("mouse", "mice"),
    ("goose", "geese"),
];

/// Pluralize a lowercase word or the last segment of a snake_case name.
pub fn pluralize(word: &str) -> String {
    let (prefix, last) = match word.rfind('_') {
        Some(i) => word.split_at(i + 1),
        None => ("", word),
    };

    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == last) {
        return format!("{prefix}{plural}");
    }

    let plural = if let Some(stem) = last.strip_suffix('y').filter(|stem| {
        stem.chars()
            .last()
            .is_some_and(|c| !"aeiou".contains(c))
    }) {
        format!("{stem}ies")
    } else if ["s", "sh", "ch", "x", "z", "o"].iter().any(|s| last.ends_with(s)) {
        format!("{last}es")
    } else if let Some(stem) = last.strip_suffix("fe") {
        format!("{stem}ves")
    } else if let Some(stem) = last.strip_suffix('f') {
        format!("{stem}ves")
    } else {
        format!("{last}s")
    };

    format!("{prefix}{plural}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("leaf"), "leaves");
        assert_eq!(pluralize("knife"), "knives");
    }

    #[test]
    fn test_irregular_plurals() {
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("mouse"), "mice");
    }

    #[test]
    fn test_snake_case_pluralizes_last_segment() {
        assert_eq!(pluralize("blog_post"), "blog_posts");
        assert_eq!(pluralize("sales_person"), "sales_people");
    }
}
