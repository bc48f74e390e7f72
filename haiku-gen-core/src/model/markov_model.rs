use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use rand::prelude::IteratorRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::generator::GenerateError;
use super::state::State;
use crate::syllable::SyllableDictionary;

/// Draw budget for `random_key` rejection sampling. With any corpus whose
/// vocabulary contains words of every syllable count from 1 up to the
/// largest line target, the budget is never reached; it turns a silent
/// hang on a degenerate corpus into a diagnosable error.
const MAX_KEY_DRAWS: usize = 10_000;

/// Context length of a Markov model: one prior word or two.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
	First,
	Second,
}

impl Order {
	/// Number of words in a context key.
	pub fn context_len(self) -> usize {
		match self {
			Order::First => 1,
			Order::Second => 2,
		}
	}
}

impl fmt::Display for Order {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.context_len())
	}
}

#[derive(Debug, Error)]
pub enum ModelError {
	#[error("cannot merge an order-{0} model into an order-{1} model")]
	OrderMismatch(Order, Order),
	#[error("cannot merge state '{0}' into state '{1}'")]
	StateKeyMismatch(String, String),
}

/// A word-level Markov model of fixed order.
///
/// Maps a context key (one word, or two words joined by a single space)
/// to the multiset of words observed to follow it in the corpus.
///
/// # Responsibilities
/// - Build the model by sliding a window of `order + 1` over a token sequence
/// - Look up the successors of a context (absence is a valid, expected case)
/// - Sample a random, syllable-budget-compatible context as a fallback seed
/// - Merge with another model of the same order
///
/// # Invariants
/// - Each state in `states` corresponds to a unique context of `order` words
/// - Every state holds at least one successor
/// - Immutable once training is done
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MarkovModel {
	order: Order,
	states: HashMap<String, State>,
}

impl MarkovModel {
	/// Creates an empty model of the given order.
	pub fn new(order: Order) -> Self {
		Self { order, states: HashMap::new() }
	}

	/// Builds a model from an ordered token sequence.
	///
	/// Deterministic given the input sequence: each context's successor
	/// list is in corpus order.
	pub fn build(tokens: &[String], order: Order) -> Self {
		let mut model = Self::new(order);
		model.add_tokens(tokens);
		model
	}

	pub fn order(&self) -> Order {
		self.order
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Iterates over the context keys, in no particular order.
	pub fn contexts(&self) -> impl Iterator<Item = &str> {
		self.states.keys().map(String::as_str)
	}

	/// Ingests a token sequence.
	///
	/// For each position where a full window of `order + 1` tokens fits,
	/// the first `order` tokens (space-joined) form the context and the
	/// last token is appended to its successor list.
	pub fn add_tokens(&mut self, tokens: &[String]) {
		let context_len = self.order.context_len();
		for window in tokens.windows(context_len + 1) {
			let context = window[..context_len].join(" ");
			let successor = &window[context_len];
			let state = self.states.entry(context.clone()).or_insert_with(|| State::new(&context));
			state.add_successor(successor);
		}
	}

	/// Returns the successors observed after `context`, duplicates included.
	///
	/// An unknown context yields an empty slice; that is not a failure,
	/// the caller's fallback policy handles it.
	pub fn successors_of(&self, context: &str) -> &[String] {
		self.states
			.get(context)
			.map(State::successors)
			.unwrap_or_default()
	}

	/// Samples a uniformly random context key whose total syllable count
	/// fits `max_syllables`.
	///
	/// Used as a fallback seed when the current context has no usable
	/// continuation, not for output words directly. Rejection sampling is
	/// bounded by an explicit draw budget.
	///
	/// # Errors
	/// - `EmptyModel` if the model has no contexts
	/// - `RetryBudgetExceeded` if no fitting key is found within the budget
	/// - `Syllable` if a sampled key contains a word missing from the dictionary
	pub fn random_key<R: Rng>(
		&self,
		dictionary: &SyllableDictionary,
		max_syllables: usize,
		rng: &mut R,
	) -> Result<&str, GenerateError> {
		for _ in 0..MAX_KEY_DRAWS {
			let Some(key) = self.states.keys().choose(rng) else {
				return Err(GenerateError::EmptyModel);
			};
			if dictionary.syllables_of(key)? <= max_syllables {
				return Ok(key);
			}
		}
		Err(GenerateError::RetryBudgetExceeded {
			draws: MAX_KEY_DRAWS,
			max_syllables,
		})
	}

	/// Merges another model into this one.
	///
	/// Matching contexts get the other model's observations appended;
	/// new contexts are cloned. Intended for combining partial models
	/// built in parallel from corpus chunks.
	///
	/// # Errors
	/// Returns an error if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.order != other.order {
			return Err(ModelError::OrderMismatch(other.order, self.order));
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}
}
