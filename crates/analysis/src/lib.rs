//! Prompt composition and response cleanup for the thought relay.
//!
//! Nothing in here does I/O apart from [`PromptBuilder::from_file`], which is
//! meant to run once at startup.

pub mod extract;
pub mod payload;
pub mod prompt;

pub use extract::{extract_json_text, parse_analysis, FormatError};
pub use payload::{backfill, degraded, ErrorBody, EXPECTED_KEYS, PLACEHOLDER};
pub use prompt::{Mode, PromptBuilder};
