use serde::{Deserialize, Serialize};

use super::markov_model::ModelError;

/// A state in a word-level Markov model.
///
/// A `State` corresponds to one fixed context (`key`, one or two
/// space-joined words) and stores every successor word observed after
/// that context, in corpus order. Repetition in the list encodes
/// observed frequency: sampling uniformly over it weights words by how
/// often they followed the context, with no explicit probabilities.
///
/// ## Invariants
/// - All successors belong to the same `key`
/// - Successor order is ingestion order (corpus order, or chunk order
///   under a merged parallel build)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct State {
	/// Identifier of the state (the context words, space-joined).
	key: String,
	/// Every word observed to follow `key`, duplicates included.
	successors: Vec<String>,
}

impl State {
	/// Creates a new state for the given context with no observations.
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			successors: Vec::new(),
		}
	}

	/// Records one observation of `word` following this context.
	pub fn add_successor(&mut self, word: &str) {
		self.successors.push(word.to_owned());
	}

	pub fn successors(&self) -> &[String] {
		&self.successors
	}

	/// Merges another state into this one by appending its observations.
	///
	/// Both states must represent the same context. Intended for
	/// combining partial models built from corpus chunks.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.key != other.key {
			return Err(ModelError::StateKeyMismatch(other.key.clone(), self.key.clone()));
		}
		self.successors.extend(other.successors.iter().cloned());
		Ok(())
	}
}
