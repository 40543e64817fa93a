// src/analyze/mod.rs
//! Article analysis: categorization, batch ranking, and digest generation,
//! each with a deterministic non-LLM fallback.

pub mod categorize;
pub mod llm;
pub mod rank;
pub mod summarize;

pub use crate::analyze::llm::{build_llm_client, LlmClient, SharedLlm};
pub use crate::analyze::rank::{RankedArticle, NEUTRAL_SCORE};
