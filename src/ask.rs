//! `ragdesk ask` and `ragdesk chat`.
//!
//! Both commands ingest the given paths into a fresh session first. `ask`
//! prints one answer; `chat` answers one question per input line.
//!
//! # Chat commands
//!
//! | Input | Effect |
//! |-------|--------|
//! | `:quit` / `:q` | Leave the loop (EOF does the same) |
//! | `:status` | Print document and chunk counts, strategy and `top_k` |
//! | `:reset` | Drop every document from the session |
//! | anything else | Treated as a question |

use anyhow::Result;
use ragdesk_core::Session;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::ingest::load_session;

/// Ingest `paths` and print the answer to `query`.
pub fn run_ask(config: &Config, query: &str, paths: &[PathBuf]) -> Result<()> {
    let (session, report) = load_session(config, paths)?;
    if report.accepted.is_empty() {
        eprintln!("No documents with text were found.");
    }
    println!("{}", session.ask(query));
    Ok(())
}

/// Ingest `paths` and answer questions read from stdin.
pub fn run_chat(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let (mut session, report) = load_session(config, paths)?;
    eprintln!(
        "Loaded {} document(s), {} chunk(s). Type :quit to exit.",
        report.accepted.len(),
        session.chunk_count()
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    chat_loop(&mut session, stdin.lock(), stdout.lock())
}

/// Question/answer loop over arbitrary input and output streams.
pub fn chat_loop<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut out: W,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        match line.trim() {
            "" => continue,
            ":quit" | ":q" => break,
            ":status" => writeln!(
                out,
                "documents: {}  chunks: {}  strategy: {}  top_k: {}",
                session.document_count(),
                session.chunk_count(),
                session.strategy_name(),
                session.params().top_k
            )?,
            ":reset" => {
                session.reset();
                writeln!(out, "Session cleared.")?;
            }
            query => {
                writeln!(out, "{}", session.ask(query))?;
                writeln!(out)?;
            }
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdesk_core::session::NOTHING_INDEXED_MESSAGE;

    fn run(session: &mut Session, input: &str) -> String {
        let mut out = Vec::new();
        chat_loop(session, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_chat_answers_each_line() {
        let mut session = Session::default();
        session.add_document(b"The cat sat on the mat.", "cat.txt");
        let out = run(&mut session, "cat\n\nmat\n");
        assert_eq!(out.matches("Question:").count(), 2);
        assert!(out.contains("Question: cat"));
        assert!(out.contains("Question: mat"));
    }

    #[test]
    fn test_chat_stops_on_quit() {
        let mut session = Session::default();
        session.add_document(b"The cat sat on the mat.", "cat.txt");
        let out = run(&mut session, "cat\n:quit\nmat\n");
        assert!(out.contains("Question: cat"));
        assert!(!out.contains("Question: mat"));
    }

    #[test]
    fn test_chat_status_and_reset() {
        let mut session = Session::default();
        session.add_document(b"The cat sat on the mat.", "cat.txt");
        let out = run(&mut session, ":status\n:reset\n:status\ncat\n");
        assert!(out.contains("documents: 1  chunks: 1  strategy: tfidf  top_k: 3"));
        assert!(out.contains("Session cleared."));
        assert!(out.contains("documents: 0  chunks: 0"));
        assert!(out.contains(NOTHING_INDEXED_MESSAGE));
    }
}
