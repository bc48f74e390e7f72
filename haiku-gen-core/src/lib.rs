//! Markov-chain haiku generation library.
//!
//! This crate provides everything needed to generate 5-7-5 haikus from a
//! training corpus:
//! - Syllable accounting backed by a phonetic dictionary
//! - First- and second-order word-level Markov models
//! - Corpus tokenization and model training (with a binary model cache)
//! - Constrained line generation with a fallback/reseed policy
//!
//! All models and dictionaries are built once at startup and are immutable
//! afterwards; generation only reads shared state. Every sampling operation
//! takes an explicit random-number source so results are reproducible under
//! a seeded generator.

/// Markov models, training and the haiku generator.
pub mod model;

/// Training-corpus loading and tokenization.
pub mod corpus;

/// Syllable dictionary and phrase-level syllable accounting.
pub mod syllable;

/// I/O utilities (file loading, cache path helpers).
///
/// Not exposed
pub(crate) mod io;
