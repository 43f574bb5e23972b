//! upskill-core: MCQ parsing, answer evaluation and the quiz workflow.
//!
//! This crate defines the question/answer data model, the parser that turns
//! model-generated text into structured questions, the evaluator that scores
//! submitted answers, and the traits the rest of upskill plugs into.

pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod prompt;
pub mod report;
pub mod service;
pub mod store;
pub mod traits;
