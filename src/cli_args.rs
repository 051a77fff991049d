// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use clap::Parser;

/// Lookup cache server resolving NEMO storage bins to their owners, built for
/// e-ink shelf labels. Configuration comes from the environment; the flags
/// below override the bind address for local runs.
#[derive(Parser, Default)]
#[command(version, long_about, author)]
pub struct BinLookupArgs {
    /// Listening IP address, overriding the SERVER_HOST environment variable.
    #[arg(long, value_name = "IP")]
    pub host: Option<String>,

    /// Listening port, overriding the SERVER_PORT environment variable.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}
