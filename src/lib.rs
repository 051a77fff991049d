// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! Read-through lookup cache in front of the NEMO identity/inventory API.
//!
//! E-ink shelf labels ask this service one question: "who owns bin X?". Answering
//! that from the upstream API directly is far too slow for a battery-powered
//! display, so we pre-fetch the full user and bin collections, hold them in two
//! in-memory indexes, and rebuild both whenever the cache ages past its TTL.

pub mod cache;
pub mod cli_args;
pub mod config;
pub mod index;
pub mod nemo;
pub mod resolver;
pub mod time;
pub mod web;
