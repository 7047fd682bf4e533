use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Static description of a persisted collection.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    pub collection: &'static str,
    /// Fields whose values must be unique across the collection.
    pub unique: &'static [UniqueField],
    /// Fields that must point at an existing entity at insert time.
    pub references: &'static [ReferenceField],
    /// Fields (scalar or array) with a maintained reverse lookup.
    pub indexed: &'static [&'static str],
    /// Array fields that may be mutated with a [`SetOperation`].
    pub set_fields: &'static [&'static str],
}

impl EntityDescriptor {
    pub fn unique_field(&self, field: &str) -> Option<&'static UniqueField> {
        self.unique.iter().find(|unique| unique.field == field)
    }

    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexed.contains(&field)
    }

    pub fn is_set_field(&self, field: &str) -> bool {
        self.set_fields.contains(&field)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UniqueField {
    pub field: &'static str,
    /// Whether string comparisons ignore case (e.g., "Foo" == "foo")
    pub case_insensitive: bool,
}

impl UniqueField {
    pub fn normalize(&self, value: &str) -> String {
        if self.case_insensitive {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReferenceField {
    pub field: &'static str,
    pub target: &'static str,
}

/// A record stored in a [`DocumentStore`](crate::store::DocumentStore) collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const DESCRIPTOR: EntityDescriptor;

    fn id(&self) -> &str;

    /// Insertion sequence assigned by the store.
    fn seq(&self) -> u64;
}

/// Atomic membership change applied to an array-valued field.
///
/// The store applies the operation to the value it holds at the moment of the
/// update, never to a copy read earlier by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetOperation {
    /// Remove the value when present, otherwise append it.
    Toggle { value: String },
    /// Drop every id listed in `strip`, then append `value`.
    Insert { value: String, strip: Vec<String> },
    /// Drop every listed id.
    Remove { values: Vec<String> },
}

impl SetOperation {
    pub fn toggle(value: impl Into<String>) -> Self {
        Self::Toggle { value: value.into() }
    }

    /// Apply the operation to `current`, preserving the order of retained entries.
    pub fn apply(&self, current: &[String]) -> Vec<String> {
        match self {
            SetOperation::Toggle { value } => {
                if current.contains(value) {
                    current.iter().filter(|item| *item != value).cloned().collect()
                } else {
                    let mut next = current.to_vec();
                    next.push(value.clone());
                    next
                }
            }
            SetOperation::Insert { value, strip } => {
                let mut next: Vec<String> = current
                    .iter()
                    .filter(|item| *item != value && !strip.contains(item))
                    .cloned()
                    .collect();
                next.push(value.clone());
                next
            }
            SetOperation::Remove { values } => {
                current.iter().filter(|item| !values.contains(item)).cloned().collect()
            }
        }
    }
}

/// String values held by `field` of a JSON document: the scalar itself, or every
/// string element of an array.
pub(crate) fn field_values(document: &Value, field: &str) -> Vec<String> {
    match document.get(field) {
        Some(Value::String(value)) => vec![value.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}
