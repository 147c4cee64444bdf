//! Layer merging for TOML configuration trees.

/// Merge `overlay` into `base`.
///
/// Tables merge key by key, recursively. Any other overlay value, arrays
/// included, replaces the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                match base_table.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                    },
                }
            }
        },
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Set the value at a dotted `path`, creating intermediate tables.
///
/// A non-table value found on the way is replaced by a table.
pub fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_table() {
            *current = toml::Value::Table(toml::Table::new());
        }
        let toml::Value::Table(table) = current else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_tables_merge_recursively() {
        let mut base = parse("[i18n]\ndefault_locale = \"en\"\nlocales = [\"en\"]\n");
        let overlay = parse("[i18n]\nlocales = [\"en\", \"fr\"]\n");
        deep_merge(&mut base, &overlay);
        assert_eq!(base["i18n"]["default_locale"].as_str(), Some("en"));
        assert_eq!(base["i18n"]["locales"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = parse("directives = [\"a\", \"b\"]");
        deep_merge(&mut base, &parse("directives = [\"c\"]"));
        assert_eq!(base, parse("directives = [\"c\"]"));
    }

    #[test]
    fn test_scalar_replaces_table() {
        let mut base = parse("[theme_config]\nnavbar = { title = \"x\" }\n");
        deep_merge(&mut base, &parse("[theme_config]\nnavbar = false\n"));
        assert_eq!(base["theme_config"]["navbar"].as_bool(), Some(false));
    }

    #[test]
    fn test_set_path_creates_tables() {
        let mut root = parse("title = \"Site\"");
        set_path(&mut root, "i18n.current_locale", toml::Value::from("fr"));
        set_path(&mut root, "base_url", toml::Value::from("/docs/"));
        assert_eq!(root["i18n"]["current_locale"].as_str(), Some("fr"));
        assert_eq!(root["base_url"].as_str(), Some("/docs/"));
        assert_eq!(root["title"].as_str(), Some("Site"));
    }
}
