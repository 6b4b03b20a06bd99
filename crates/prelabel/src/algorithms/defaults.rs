use crate::{task::Task, types::Defaults};

/// Attribute defaults for a task.
///
/// `meta` wins over `data`: non-empty `meta.couleurs` replaces
/// `data.default_colors`, and the first entry of `meta.tailles` / `meta.motifs`
/// replaces `data.default_taille` / `data.default_motif` unless that entry is
/// empty or not a string. Total: absent or
/// malformed fields simply yield an empty list or `None`.
pub fn extract_defaults(task: &Task) -> Defaults {
    let meta = &task.meta;
    let data = &task.data;

    let colors = if meta.colors.is_empty() {
        data.default_colors.clone()
    } else {
        meta.colors.clone()
    };

    Defaults {
        colors,
        size: meta.size.clone().or_else(|| data.default_size.clone()),
        pattern: meta.pattern.clone().or_else(|| data.default_pattern.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(value: serde_json::Value) -> Task {
        Task::from_value(value).unwrap()
    }

    #[test]
    fn test_meta_takes_precedence() {
        let defaults = extract_defaults(&task(json!({
            "data": { "default_colors": ["Gris"], "default_taille": "Petite", "default_motif": "Uni" },
            "meta": { "couleurs": ["Noir", "Blanc"], "tailles": ["Grande", "Moyenne"], "motifs": ["Barré"] }
        })));

        assert_eq!(defaults.colors, vec!["Noir", "Blanc"]);
        assert_eq!(defaults.size.as_deref(), Some("Grande"));
        assert_eq!(defaults.pattern.as_deref(), Some("Barré"));
    }

    #[test]
    fn test_falls_back_to_data_per_field() {
        let defaults = extract_defaults(&task(json!({
            "data": { "default_colors": ["Gris"], "default_taille": "Petite", "default_motif": "Uni" },
            "meta": { "couleurs": [], "tailles": ["Grande"] }
        })));

        assert_eq!(defaults.colors, vec!["Gris"]);
        assert_eq!(defaults.size.as_deref(), Some("Grande"));
        assert_eq!(defaults.pattern.as_deref(), Some("Uni"));
    }

    #[test]
    fn test_bad_first_entry_falls_back_to_data() {
        let defaults = extract_defaults(&task(json!({
            "data": { "default_taille": "Petite", "default_motif": "Uni" },
            "meta": { "tailles": ["", "Grande"], "motifs": [1, "Barré"] }
        })));

        assert_eq!(defaults.size.as_deref(), Some("Petite"));
        assert_eq!(defaults.pattern.as_deref(), Some("Uni"));
    }

    #[test]
    fn test_nothing_available() {
        let defaults = extract_defaults(&task(json!({ "data": { "image": "a.jpg" } })));
        assert!(defaults.is_empty());
    }

    #[test]
    fn test_malformed_fields_never_fail() {
        let defaults = extract_defaults(&task(json!({
            "data": { "default_colors": 4, "default_motif": ["Uni"] },
            "meta": { "couleurs": { "a": 1 }, "tailles": "Grande" }
        })));
        assert!(defaults.is_empty());
    }
}
