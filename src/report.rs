use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;

/// One recorded validation failure. `field` is the declared path, `label`
/// the human-readable name substituted into the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub label: String,
    pub message: String,
}

/// Substitute the `%s` placeholder with the field's label. The only
/// placeholder the message syntax supports.
pub(crate) fn fill(template: &str, label: &str) -> String {
    template.replace("%s", label)
}

/// The aggregate produced once every field's chain has settled: the
/// declaration-ordered error list and the sanitized output tree. Every
/// declared field's path is guaranteed present in `values`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub errors: Vec<ValidationError>,
    pub values: Value,
}

impl Report {
    /// Computed, never cached: valid exactly when no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Ordered messages for one field. Empty for a clean field, never absent.
    pub fn errors_for(&self, field: &str) -> Vec<String> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Field path → ordered message list; keys are exactly the fields with
    /// at least one error.
    pub fn errors_by_field(&self) -> HashMap<String, Vec<String>> {
        self.errors
            .iter()
            .map(|e| (e.field.clone(), e.message.clone()))
            .into_group_map()
    }

    /// Flat message list in declaration order, for response rendering.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn err(field: &str, message: &str) -> ValidationError {
        ValidationError {
            field: field.into(),
            label: field.into(),
            message: message.into(),
        }
    }

    #[test]
    fn fill_replaces_every_placeholder() {
        assert_eq!(fill("%s is required", "Email"), "Email is required");
        assert_eq!(fill("no placeholder", "Email"), "no placeholder");
    }

    #[test]
    fn grouping_and_lookup_shapes() {
        let report = Report {
            errors: vec![
                err("email", "Email is not an email address"),
                err("email", "Email is too long"),
                err("age", "Age is not an integer"),
            ],
            values: json!({}),
        };
        assert!(!report.is_valid());
        assert_eq!(
            report.errors_for("email"),
            vec!["Email is not an email address", "Email is too long"]
        );
        assert_eq!(report.errors_for("name"), Vec::<String>::new());

        let grouped = report.errors_by_field();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["age"], vec!["Age is not an integer"]);
        assert!(!grouped.contains_key("name"));
    }
}
