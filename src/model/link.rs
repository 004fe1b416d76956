use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// A payload type that can appear nested inside another entity's body.
pub trait Linkable: DeserializeOwned {
    /// Name of the identifier member in JSON.
    const ID_FIELD: &'static str;
}

/// A nested association in a request body.
///
/// `{"id": 3}` references an existing record, `{"id": 3, "name": ".."}`
/// replaces that record with the nested fields, and an object without an
/// identifier creates a new record. The write of the outer entity cascades
/// to the nested one.
#[derive(Debug, Clone, PartialEq)]
pub enum Link<T> {
    Reference(u64),
    Merge(u64, T),
    Create(T),
}

impl<T> Link<T> {
    pub fn id(&self) -> Option<u64> {
        match self {
            Link::Reference(id) | Link::Merge(id, _) => Some(*id),
            Link::Create(_) => None,
        }
    }
}

impl<'de, T: Linkable> Deserialize<'de> for Link<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::deserialize(deserializer)?;
        // hypermedia echoed back by clients carries no state
        fields.remove("_links");

        let id = match fields.remove(T::ID_FIELD) {
            None | Some(Value::Null) => None,
            Some(v) => Some(u64::deserialize(v).map_err(D::Error::custom)?),
        };

        let body = || T::deserialize(Value::Object(fields.clone())).map_err(D::Error::custom);

        Ok(match id {
            Some(id) if fields.is_empty() => Link::Reference(id),
            Some(id) => Link::Merge(id, body()?),
            None => Link::Create(body()?),
        })
    }
}
