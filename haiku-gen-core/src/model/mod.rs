//! Word-level Markov models and the haiku generator built on them.
//!
//! This module provides:
//! - Order-parameterised Markov models (`MarkovModel`)
//! - Combined first/second-order training with a binary cache (`TrainedModels`)
//! - Internal context-state management (`State`)
//! - Budget-constrained haiku generation (`HaikuGenerator`)

/// Fixed-order word-level Markov model (order 1 or 2).
///
/// Handles token-sequence ingestion, successor lookup, budget-hinted
/// random-key sampling, and model merging.
pub mod markov_model;

/// First- and second-order models trained from one corpus.
///
/// Supports deterministic sequential builds, chunked parallel builds,
/// and loading via a binary on-disk cache.
pub mod training;

/// Constrained 5-7-5 line construction and haiku assembly.
///
/// Exposes the high-level generator interface, its error type and the
/// finished `Haiku` value.
pub mod generator;

/// Internal representation of a single Markov context.
///
/// Tracks the ordered successor list for one context key.
/// This module is not exposed publicly.
mod state;
