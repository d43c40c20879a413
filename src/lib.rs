//! Normalization and quality core for machine-generated hearing transcripts.
//!
//! | Module | Role |
//! |--------|------|
//! | [`dictionary`] | versioned term dictionary with backup-on-write |
//! | [`extract`] | locates the legally significant section of a hearing |
//! | [`clean`] | removes filler tics and repetitions |
//! | [`correct`] | ordered dictionary passes and cross-validation |
//! | [`learn`] | proposes dictionary entries from verified references |
//! | [`qa`] | composite score, structural criteria and verdict |
//! | [`pipeline`] | per-document flow and batch runner |
//! | [`config`] | `settings.toml` and platform paths |

pub mod clean;
pub mod config;
pub mod correct;
pub mod dictionary;
pub mod extract;
pub mod learn;
pub mod pipeline;
pub mod qa;
pub mod text;
pub mod transcript;
