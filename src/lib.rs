//! # ragdesk
//!
//! A minimal retrieval-augmented search tool for small text documents.
//!
//! Documents are split into overlapping chunks and indexed for similarity
//! search; questions are answered by listing the most similar chunks with
//! their scores. Nothing is generated: every line of an answer comes from
//! the uploaded material.
//!
//! The retrieval pipeline lives in [`ragdesk_core`]. This crate wraps it
//! in configuration, file ingest, a CLI and an HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────────────────┐
//! │ files / dirs│──▶│ Session (ragdesk-core)           │
//! │ HTTP upload │   │ load ▶ chunk ▶ index ▶ compose   │
//! └─────────────┘   └───────────────┬──────────────────┘
//!                                   │
//!                      ┌────────────┴──────┐
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │ ask/chat │       │  (axum)  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ragdesk ask "how do lifetimes work?" ./notes
//! ragdesk chat ./notes ./book.txt
//! ragdesk status ./notes
//! ragdesk serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Index strategy selection and local embeddings |
//! | [`ingest`] | Walking files into a session |
//! | [`ask`] | One-shot and interactive questions |
//! | [`status`] | Ingest summary |
//! | [`server`] | HTTP server |

pub mod ask;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod server;
pub mod status;
