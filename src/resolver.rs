// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Joins a bin record to its owning user and shapes the display payload.
//!
//! Pure and deterministic: every malformed input narrows the result instead of
//! producing an error. An unknown bin is `None`; a bin with no resolvable owner
//! is a result with `owner: None`.

use crate::index::{BinIndex, UserIndex};
use crate::nemo::{CustomerField, UserRecord};
use serde::Serialize;

/// Display-ready lookup payload. This is exactly what the shelf-label firmware
/// renders, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    /// The key the caller asked for, id or name
    pub bin_id: String,
    pub bin_name: String,
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Owner {
    pub name: String,
    pub username: String,
    pub email: String,
}

impl Owner {
    fn from_user(user: &UserRecord) -> Self {
        Self {
            name: display_name(user),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Space-joined non-empty first/last name, falling back to the username, and
/// finally to the literal "Unknown".
fn display_name(user: &UserRecord) -> String {
    let name = [user.first_name.as_str(), user.last_name.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<&str>>()
        .join(" ");
    if !name.is_empty() {
        name
    } else if !user.username.is_empty() {
        user.username.clone()
    } else {
        "Unknown".to_string()
    }
}

/// Resolve a bin key to its display payload against one consistent index pair.
pub fn resolve(bin_key: &str, users: &UserIndex, bins: &BinIndex) -> Option<LookupResult> {
    let bin = bins.get(bin_key)?;
    let owner = bin
        .customer
        .as_ref()
        .and_then(CustomerField::user_id)
        .and_then(|customer_id| users.get(&customer_id))
        .map(Owner::from_user);
    Some(LookupResult {
        bin_id: bin_key.to_string(),
        bin_name: bin.name.clone().unwrap_or_default(),
        owner,
    })
}
