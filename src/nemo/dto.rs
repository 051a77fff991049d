// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! DTOs for NEMO API response parsing

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One page of a NEMO collection. The API answers in one of two shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Page {
    /// Django-REST style envelope with an optional cursor to the next page.
    /// `next: null` terminates pagination.
    Paginated {
        results: Vec<Value>,
        next: Option<String>,
    },
    /// The whole collection in one bare array, no further pages.
    Array(Vec<Value>),
}

/// A user profile as held in the user index. Records are immutable once indexed
/// and replaced wholesale on every refresh.
///
/// Deserialization requires `id`; everything else defaults to empty, matching
/// how little the shelf-label display actually needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub username: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub last_name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub email: String,
}

/// A bin as held in the bin index. NEMO calls these `recurring_consumable_charges`;
/// the upstream record carries plenty more fields, but id, name and the customer
/// reference are all the lookup ever serves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BinRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerField>,
}

/// The `customer` field of a bin record. The shape is upstream's choice, not
/// ours: depending on the endpoint and NEMO version it arrives as a plain user
/// id, a stringified id, or an expanded user object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CustomerField {
    Id(u64),
    Text(String),
    Nested(CustomerObject),
    /// Any other shape. Carries no usable reference, but must not fail the record.
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerObject {
    pub id: Option<u64>,
}

impl CustomerField {
    /// Extract the owning user id, if this shape carries one. A non-numeric
    /// string is discarded rather than treated as an error.
    pub fn user_id(&self) -> Option<u64> {
        match self {
            CustomerField::Id(id) => Some(*id),
            CustomerField::Text(text) => text.parse().ok(),
            CustomerField::Nested(object) => object.id,
            CustomerField::Other(_) => None,
        }
    }
}

/// NEMO emits `null` for blank profile fields; fold that into an empty string.
fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
