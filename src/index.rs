// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Builders for the two in-memory indexes.
//!
//! Indexing never fails: malformed records are dropped and counted, so one bad
//! upstream record cannot abort a whole rebuild.

use crate::nemo::{BinRecord, UserRecord};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

pub type UserIndex = HashMap<u64, UserRecord, ahash::RandomState>;

/// Keyed by stringified bin id and, where present and distinct, by bin name.
/// Two keys can therefore point at the same underlying record.
pub type BinIndex = HashMap<String, BinRecord, ahash::RandomState>;

/// Normalize raw user records into the user index. Records without an `id` or
/// with unusable field shapes are skipped.
pub fn index_users(records: Vec<Value>) -> UserIndex {
    let mut users = UserIndex::default();
    let mut skipped: usize = 0;
    for record in records {
        match serde_json::from_value::<UserRecord>(record) {
            Ok(user) => {
                users.insert(user.id, user);
            }
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("skipped {skipped} user records with no id or unusable fields");
    }
    users
}

/// Normalize raw bin records into the bin index. A record lands under its
/// stringified id and additionally under its name when the name is non-empty
/// and differs from the id string.
///
/// A bin named like another bin's id will shadow that id key. NEMO does not
/// forbid this, and neither do we; the last record wins.
pub fn index_bins(records: Vec<Value>) -> BinIndex {
    let mut bins = BinIndex::default();
    let mut skipped: usize = 0;
    for record in records {
        let bin = match serde_json::from_value::<BinRecord>(record) {
            Ok(bin) => bin,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let id_key = bin.id.map(|id| id.to_string());
        let name_key = bin
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .filter(|name| id_key.as_deref() != Some(name.as_str()));
        if id_key.is_none() && name_key.is_none() {
            skipped += 1;
            continue;
        }
        if let Some(name) = name_key {
            bins.insert(name, bin.clone());
        }
        if let Some(id) = id_key {
            bins.insert(id, bin);
        }
    }
    if skipped > 0 {
        debug!("skipped {skipped} bin records with no usable key");
    }
    bins
}
