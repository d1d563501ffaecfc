use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;

/// A reference to another record that the backend may or may not have
/// expanded.
///
/// On the wire this is a bare id string, the embedded object, a projection
/// of it carrying only some fields, or `null` once the target is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Unresolved(String),
    Resolved(Box<T>),
    /// An embedded object lacking fields `T` requires. Kept as sent.
    Partial(Map<String, Value>),
    Missing,
}

impl<T> Default for Ref<T> {
    fn default() -> Self {
        Ref::Missing
    }
}

impl<T: Resource> Ref<T> {
    /// The referenced record's id, when one was sent.
    pub fn id(&self) -> Option<&str> {
        match self {
            Ref::Unresolved(id) => Some(id),
            Ref::Resolved(record) => record.id(),
            Ref::Partial(fields) => fields.get("_id").and_then(Value::as_str),
            Ref::Missing => None,
        }
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Ref::Resolved(record) => Some(record),
            _ => None,
        }
    }

    /// A string field of an embedded object, full or partial, e.g.
    /// `field("titulo")` for a display label.
    pub fn field(&self, name: &str) -> Option<String>
    where
        T: Serialize,
    {
        match self {
            Ref::Partial(fields) => fields.get(name).and_then(Value::as_str).map(str::to_string),
            Ref::Resolved(record) => serde_json::to_value(record)
                .ok()?
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string),
            Ref::Unresolved(_) | Ref::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Ref::Missing)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Ref::Resolved(_))
    }
}

impl<T> From<String> for Ref<T> {
    fn from(id: String) -> Self {
        Ref::Unresolved(id)
    }
}

impl<T> From<&str> for Ref<T> {
    fn from(id: &str) -> Self {
        Ref::Unresolved(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Book, Category};

    #[test]
    fn bare_string_is_unresolved() {
        let r: Ref<Category> = serde_json::from_str(r#""cat-1""#).unwrap();
        assert_eq!(r, Ref::Unresolved("cat-1".to_string()));
        assert_eq!(r.id(), Some("cat-1"));
        assert!(r.resolved().is_none());
    }

    #[test]
    fn embedded_object_is_resolved() {
        let r: Ref<Category> =
            serde_json::from_str(r#"{"_id":"cat-2","nome":"Romance"}"#).unwrap();
        assert!(r.is_resolved());
        assert_eq!(r.id(), Some("cat-2"));
        assert_eq!(r.resolved().unwrap().name, "Romance");
    }

    #[test]
    fn projected_object_keeps_its_id() {
        let r: Ref<Book> = serde_json::from_str(r#"{"_id":"b1","titulo":"Dom Casmurro"}"#).unwrap();
        assert!(matches!(r, Ref::Partial(_)));
        assert_eq!(r.id(), Some("b1"));
        assert_eq!(r.field("titulo").as_deref(), Some("Dom Casmurro"));
        assert!(r.resolved().is_none());
    }

    #[test]
    fn null_is_missing() {
        let r: Ref<Book> = serde_json::from_str("null").unwrap();
        assert!(r.is_missing());
        assert_eq!(r.id(), None);
    }

    #[test]
    fn unresolved_serializes_as_plain_id() {
        let r: Ref<Category> = Ref::from("cat-3");
        assert_eq!(serde_json::to_string(&r).unwrap(), r#""cat-3""#);
    }
}
