// src/main.rs

use anyhow::Result;

fn main() -> Result<()> {
    batch_rename::commands::run_cli()
}
