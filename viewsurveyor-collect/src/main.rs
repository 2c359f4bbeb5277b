//! View collection tool.
//!
//! This binary connects to a database and records the columns, definition
//! text, and comments of every view in a schema.
//!
//! # Security Guarantees
//! - Read-only database operations only
//! - No credentials stored or logged
//! - Offline operation after database connection

use clap::Parser;
use viewsurveyor_collect::{Cli, run};
use viewsurveyor_core::{Result, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    run(cli).await
}
