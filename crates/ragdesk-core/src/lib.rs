//! # ragdesk core
//!
//! The retrieval pipeline behind ragdesk: best-effort text loading,
//! overlapping chunking, pluggable vector index strategies, answer
//! composition, and the [`session::Session`] that ties them together.
//!
//! This crate has no async runtime, network, or filesystem dependencies.
//! Concrete embedding backends (e.g. fastembed) live in the `ragdesk` app
//! crate and plug in through [`index::embedded::Embedder`].
//!
//! ```text
//! bytes ──▶ loader ──▶ chunk ──▶ index.build
//!                                     │
//! query ─────────────────────▶ index.search ──▶ answer.compose
//! ```

pub mod answer;
pub mod chunk;
pub mod index;
pub mod loader;
pub mod models;
pub mod session;

pub use session::{Session, SessionParams};
