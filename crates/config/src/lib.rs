//! Configuration for the consultation co-pilot.
//!
//! Session settings load from environment variables, with defaults for
//! everything absent (spec §6 Configuration). There is no file-based
//! configuration format here, so there is no error type for one: every
//! `Settings` field has a sensible default and `from_env` never fails.

pub mod prompt;
pub mod settings;

pub use prompt::PromptBuilder;
pub use settings::Settings;
