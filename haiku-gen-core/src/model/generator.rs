use rand::Rng;
use thiserror::Error;

use super::markov_model::MarkovModel;
use super::training::TrainedModels;
use crate::syllable::{SyllableDictionary, SyllableError};

const FIRST_LINE_SYLLABLES: usize = 5;
const SECOND_LINE_SYLLABLES: usize = 7;
const THIRD_LINE_SYLLABLES: usize = 5;

/// Syllable ceiling used when drawing a fallback context. A fixed,
/// generous value unrelated to the current line budget: the fallback
/// seed itself never appears in the output, only its successors do.
const FALLBACK_KEY_SYLLABLES: usize = 8;

/// How many fallback contexts `pick_next` tries before giving up.
const MAX_FALLBACK_DRAWS: usize = 1_000;

#[derive(Debug, Error)]
pub enum GenerateError {
	#[error(transparent)]
	Syllable(#[from] SyllableError),
	/// "Last two words" was asked of a line with fewer than two words.
	/// A contract violation, fatal for the current attempt.
	#[error("context '{0}' has fewer than two words")]
	EmptyContext(String),
	#[error("the model has no contexts to sample")]
	EmptyModel,
	#[error("gave up after {draws} draws without a candidate within {max_syllables} syllables")]
	RetryBudgetExceeded { draws: usize, max_syllables: usize },
}

/// A finished haiku: exactly three lines of 5, 7 and 5 syllables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Haiku {
	lines: [String; 3],
}

impl Haiku {
	pub fn lines(&self) -> &[String; 3] {
		&self.lines
	}
}

/// One haiku line under construction, paired with its remaining
/// syllable budget. Owned by a single generation call and discarded
/// once the line is finalized.
struct PartialLine {
	words: Vec<String>,
	remaining: usize,
}

impl PartialLine {
	fn new(target: usize) -> Self {
		Self { words: Vec::new(), remaining: target }
	}

	fn remaining(&self) -> usize {
		self.remaining
	}

	/// Appends a word and deducts its syllables. Callers only push words
	/// that were selected to fit the budget.
	fn push(&mut self, word: String, syllables: usize) {
		debug_assert!(syllables <= self.remaining);
		self.words.push(word);
		self.remaining -= syllables;
	}

	fn is_complete(&self) -> bool {
		self.remaining == 0
	}

	fn trailing_bigram(&self) -> Result<String, GenerateError> {
		let [.., penultimate, last] = self.words.as_slice() else {
			return Err(GenerateError::EmptyContext(self.words.join(" ")));
		};
		Ok(format!("{penultimate} {last}"))
	}

	fn into_line(self) -> String {
		self.words.join(" ")
	}
}

/// Generates haikus by constrained sampling over trained Markov models.
///
/// # Responsibilities
/// - Build each line to an exact syllable target (5-7-5)
/// - Seed the first line from the first-order model, later lines from the
///   previous line's trailing bigram
/// - Fall back to a fresh random context whenever the chain has no
///   budget-fitting continuation
///
/// Holds only immutable state; safe to share across concurrent
/// generation calls.
#[derive(Debug)]
pub struct HaikuGenerator {
	models: TrainedModels,
	dictionary: SyllableDictionary,
}

impl HaikuGenerator {
	pub fn new(models: TrainedModels, dictionary: SyllableDictionary) -> Self {
		Self { models, dictionary }
	}

	/// Generates one haiku, chaining context across the three lines.
	pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<Haiku, GenerateError> {
		let first = self.first_line(FIRST_LINE_SYLLABLES, rng)?;
		let second = self.continuation_line(&first, SECOND_LINE_SYLLABLES, rng)?;
		let third = self.continuation_line(&second, THIRD_LINE_SYLLABLES, rng)?;
		Ok(Haiku { lines: [first, second, third] })
	}

	/// Builds the opening line of `target` syllables.
	///
	/// The seed word is drawn from the first-order model's keys but
	/// constrained to `target - 1` syllables, so there is always room
	/// for a second word and never a one-word line. The second word
	/// comes from the first-order chain; from the third word on, the
	/// line extends through the second-order model.
	///
	/// `target` must be at least 2.
	pub fn first_line<R: Rng>(&self, target: usize, rng: &mut R) -> Result<String, GenerateError> {
		let mut line = PartialLine::new(target);

		let seed = self
			.models
			.first_order
			.random_key(&self.dictionary, line.remaining() - 1, rng)?
			.to_owned();
		let seed_syllables = self.dictionary.syllables_of(&seed)?;
		line.push(seed.clone(), seed_syllables);

		let (second, syllables) =
			self.pick_next(&seed, &self.models.first_order, line.remaining(), rng)?;
		line.push(second, syllables);

		self.extend_line(line, rng)
	}

	/// Builds a continuation line of `target` syllables, seeded by the
	/// previous line.
	///
	/// The first word continues the previous line's trailing bigram
	/// (constrained to `target - 1`, same no-one-word-line policy); the
	/// second word's context bridges the line break (previous line's
	/// final word plus this line's first word); after that the line
	/// extends on its own trailing bigram.
	pub fn continuation_line<R: Rng>(
		&self,
		previous: &str,
		target: usize,
		rng: &mut R,
	) -> Result<String, GenerateError> {
		let previous_words: Vec<&str> = previous.split_whitespace().collect();
		let [.., penultimate, last] = previous_words.as_slice() else {
			return Err(GenerateError::EmptyContext(previous.to_owned()));
		};

		let mut line = PartialLine::new(target);

		let seed_context = format!("{penultimate} {last}");
		let (first, syllables) = self.pick_next(
			&seed_context,
			&self.models.second_order,
			line.remaining() - 1,
			rng,
		)?;
		let bridge = format!("{last} {first}");
		line.push(first, syllables);

		let (second, syllables) =
			self.pick_next(&bridge, &self.models.second_order, line.remaining(), rng)?;
		line.push(second, syllables);

		self.extend_line(line, rng)
	}

	/// Repeats "pick the next word within the remaining budget" on the
	/// line's trailing bigram until the budget reaches zero.
	///
	/// Each accepted word consumes at least one syllable, so this loop
	/// runs at most `target` times.
	fn extend_line<R: Rng>(&self, mut line: PartialLine, rng: &mut R) -> Result<String, GenerateError> {
		while !line.is_complete() {
			let context = line.trailing_bigram()?;
			let (word, syllables) =
				self.pick_next(&context, &self.models.second_order, line.remaining(), rng)?;
			line.push(word, syllables);
		}
		Ok(line.into_line())
	}

	/// Picks the next word for a context, constrained to `remaining` syllables.
	///
	/// If the context is unknown to the model, or none of its successors
	/// fit the budget, a fresh random context is drawn and its successors
	/// are used instead. The reseed deliberately abandons topical
	/// continuity with the prior context; that is normal, expected
	/// behavior, not an error. The word is sampled uniformly from the
	/// fitting successors, so repetition in the list weights frequency.
	///
	/// # Errors
	/// `RetryBudgetExceeded` once the fallback draw budget runs out,
	/// which only happens when no vocabulary word fits `remaining`.
	fn pick_next<R: Rng>(
		&self,
		context: &str,
		model: &MarkovModel,
		remaining: usize,
		rng: &mut R,
	) -> Result<(String, usize), GenerateError> {
		let mut candidates = self.fitting_successors(model.successors_of(context), remaining)?;

		let mut draws = 0;
		while candidates.is_empty() {
			if draws == MAX_FALLBACK_DRAWS {
				return Err(GenerateError::RetryBudgetExceeded { draws, max_syllables: remaining });
			}
			let fallback = model.random_key(&self.dictionary, FALLBACK_KEY_SYLLABLES, rng)?;
			candidates = self.fitting_successors(model.successors_of(fallback), remaining)?;
			draws += 1;
		}

		let word = candidates[rng.random_range(0..candidates.len())];
		let syllables = self.dictionary.syllables_of(word)?;
		Ok((word.to_owned(), syllables))
	}

	fn fitting_successors<'a>(
		&self,
		successors: &'a [String],
		remaining: usize,
	) -> Result<Vec<&'a String>, GenerateError> {
		let mut fitting = Vec::new();
		for word in successors {
			if self.dictionary.syllables_of(word)? <= remaining {
				fitting.push(word);
			}
		}
		Ok(fitting)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn dictionary() -> SyllableDictionary {
		SyllableDictionary::from_entries(&[
			("THE", 1),
			("OLD", 1),
			("POND", 1),
			("A", 1),
			("FROG", 1),
			("JUMPS", 1),
			("IN", 1),
			("STILL", 1),
			("WATER", 2),
			("SOUND", 1),
			("OF", 1),
		])
	}

	fn generator() -> HaikuGenerator {
		let corpus = "the old pond a frog jumps in the still water \
			the sound of water in the old pond a frog in the water \
			the old frog jumps in the pond still water sound of the old pond \
			a still frog in the old water the pond sound";
		let tokens = crate::corpus::tokenize(corpus);
		HaikuGenerator::new(TrainedModels::build(&tokens), dictionary())
	}

	fn line_syllables(generator: &HaikuGenerator, line: &str) -> usize {
		generator.dictionary.syllables_of(line).unwrap()
	}

	#[test]
	fn generated_lines_hit_their_syllable_targets() {
		let generator = generator();
		for seed in 0..25 {
			let mut rng = StdRng::seed_from_u64(seed);
			let haiku = generator.generate(&mut rng).unwrap();
			let [first, second, third] = haiku.lines();
			assert_eq!(line_syllables(&generator, first), 5, "haiku {seed}: '{first}'");
			assert_eq!(line_syllables(&generator, second), 7, "haiku {seed}: '{second}'");
			assert_eq!(line_syllables(&generator, third), 5, "haiku {seed}: '{third}'");
		}
	}

	#[test]
	fn first_line_is_never_a_single_word() {
		let generator = generator();
		for seed in 0..50 {
			let mut rng = StdRng::seed_from_u64(seed);
			let line = generator.first_line(5, &mut rng).unwrap();
			assert!(line.split_whitespace().count() >= 2, "'{line}'");
		}
	}

	#[test]
	fn generation_is_reproducible_under_one_seed() {
		let generator = generator();
		let first = generator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
		let second = generator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn pick_next_falls_back_rather_than_bust_the_budget() {
		// "red"'s only successor is the 2-syllable "onion", so with one
		// syllable left the fallback path must produce some other word.
		let dict = SyllableDictionary::from_entries(&[("RED", 1), ("ONION", 2), ("BUD", 1)]);
		let tokens = crate::corpus::tokenize("red onion bud red onion");
		let generator = HaikuGenerator::new(TrainedModels::build(&tokens), dict);

		for seed in 0..20 {
			let mut rng = StdRng::seed_from_u64(seed);
			let (word, syllables) = generator
				.pick_next("red", &generator.models.first_order, 1, &mut rng)
				.unwrap();
			assert!(syllables <= 1, "picked '{word}' ({syllables} syllables)");
			assert_ne!(word, "onion");
		}
	}

	#[test]
	fn pick_next_gives_up_when_no_word_fits() {
		let dict = SyllableDictionary::from_entries(&[("ONION", 2), ("PEPPER", 2)]);
		let tokens = crate::corpus::tokenize("onion pepper onion pepper onion");
		let generator = HaikuGenerator::new(TrainedModels::build(&tokens), dict);
		let mut rng = StdRng::seed_from_u64(3);

		assert!(matches!(
			generator.pick_next("onion", &generator.models.first_order, 1, &mut rng),
			Err(GenerateError::RetryBudgetExceeded { max_syllables: 1, .. })
		));
	}

	#[test]
	fn continuation_rejects_a_single_word_previous_line() {
		let generator = generator();
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(
			generator.continuation_line("pond", 7, &mut rng),
			Err(GenerateError::EmptyContext(_))
		));
	}

	#[test]
	fn unknown_corpus_word_is_fatal() {
		// Corpus contains a word the dictionary does not cover.
		let dict = SyllableDictionary::from_entries(&[("THE", 1), ("POND", 1)]);
		let tokens = crate::corpus::tokenize("the pond the zephyr the pond");
		let generator = HaikuGenerator::new(TrainedModels::build(&tokens), dict);
		let mut rng = StdRng::seed_from_u64(1);

		let result = generator.pick_next("the", &generator.models.first_order, 5, &mut rng);
		assert!(matches!(
			result,
			Err(GenerateError::Syllable(SyllableError::UnknownWord(word))) if word == "ZEPHYR"
		));
	}
}
