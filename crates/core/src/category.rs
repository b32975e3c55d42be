use serde::{Deserialize, Serialize};

/// A user-defined spending category. Identity is the `id`; name, color and
/// icon are user-editable. Every other record references a category by id
/// only — categories are never embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Display color as `#rrggbb`.
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Category {
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            icon: None,
        }
    }
}

/// Resolve a free-text label (from a statement's category column) against the
/// known categories, matching id first and then name, case-insensitively.
pub fn resolve_label<'a>(categories: &'a [Category], label: &str) -> Option<&'a Category> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(label))
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(label)))
}
