//! `ragdesk status`: what a set of paths turns into once ingested.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::ingest::load_session;

pub fn run_status(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let (session, report) = load_session(config, paths)?;

    println!("strategy:  {}", session.strategy_name());
    println!("documents: {}", session.document_count());
    println!("chunks:    {}", session.chunk_count());
    println!(
        "chunking:  {} chars, {} overlap",
        session.params().chunk.chunk_size,
        session.params().chunk.chunk_overlap
    );

    if !session.documents().is_empty() {
        println!();
        println!("{:<40} {:>10}", "FILE", "CHARS");
        for doc in session.documents() {
            println!("{:<40} {:>10}", doc.filename, doc.char_count());
        }
    }

    for path in &report.empty {
        println!("skipped (no text): {}", path.display());
    }
    for path in &report.failed {
        println!("skipped (unreadable): {}", path.display());
    }

    Ok(())
}
