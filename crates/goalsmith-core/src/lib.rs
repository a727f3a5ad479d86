//! Core library for goalsmith: the SMART goal data model, the prompt
//! catalog, the LLM-backed synthesis pipeline, signed session tokens,
//! credential checks and the goal store interface.

pub mod auth;
pub mod catalog;
pub mod goal;
pub mod store;
pub mod synthesis;
pub mod token;

pub use catalog::PromptCatalog;
pub use goal::{Goal, GoalRequest, UpdateRequest};
pub use synthesis::{GoalSynthesizer, Synthesized};
