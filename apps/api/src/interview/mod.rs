//! Interview pipeline: prompt building, oracle-backed question generation and
//! answer evaluation, response parsing, and the persisted interview store.

pub mod evaluation;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod question_gen;
pub mod store;
