use std::path::Path;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::markov_model::{MarkovModel, ModelError, Order};
use crate::corpus::{self, CorpusError};
use crate::io;

#[derive(Debug, Error)]
pub enum TrainingError {
	#[error(transparent)]
	Corpus(#[from] CorpusError),
	#[error(transparent)]
	Model(#[from] ModelError),
	#[error("failed to read or write the model cache: {0}")]
	Io(#[from] std::io::Error),
	#[error("failed to decode the model cache: {0}")]
	Cache(#[from] postcard::Error),
}

/// The first- and second-order Markov models trained from one corpus.
///
/// Built once at startup and immutable afterwards; generation only reads.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrainedModels {
	pub first_order: MarkovModel,
	pub second_order: MarkovModel,
}

impl TrainedModels {
	/// Builds both models sequentially from an ordered token sequence.
	pub fn build(tokens: &[String]) -> Self {
		Self {
			first_order: MarkovModel::build(tokens, Order::First),
			second_order: MarkovModel::build(tokens, Order::Second),
		}
	}

	/// Loads trained models for a corpus file, using a binary cache when present.
	///
	/// - If `corpus.txt` has a sibling `corpus.bin`, the cache is decoded
	///   with `postcard` and returned directly.
	/// - Otherwise the corpus is tokenized, the models are built in
	///   parallel, and the cache is written for future fast loading.
	pub fn load<P: AsRef<Path>>(corpus_path: P) -> Result<Self, TrainingError> {
		let cache_path = io::build_output_path(&corpus_path, "bin")?;
		if cache_path.exists() {
			let bytes = std::fs::read(&cache_path)?;
			let models: Self = postcard::from_bytes(&bytes)?;
			info!("loaded cached models from {}", cache_path.display());
			return Ok(models);
		}

		let tokens = corpus::load_tokens(&corpus_path)?;
		let models = Self::build_parallel(&tokens)?;
		info!(
			"trained models: {} first-order contexts, {} second-order contexts",
			models.first_order.len(),
			models.second_order.len()
		);

		let bytes = postcard::to_stdvec(&models)?;
		std::fs::write(&cache_path, bytes)?;

		Ok(models)
	}

	/// Builds both models from corpus chunks processed on worker threads.
	///
	/// Chunks are assigned by token start index and each order reads
	/// `order` lookahead tokens past its chunk, so every window of the
	/// corpus is ingested exactly once. Partial models are merged in
	/// chunk order, which keeps successor lists identical to a
	/// sequential build.
	fn build_parallel(tokens: &[String]) -> Result<Self, ModelError> {
		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = tokens.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for (index, start) in (0..tokens.len()).step_by(chunk_size).enumerate() {
				let tx = tx.clone();
				scope.spawn(move || {
					let partial = Self::build_chunk(tokens, start, start + chunk_size);
					// The receiver outlives the scope
					let _ = tx.send((index, partial));
				});
			}
		});
		drop(tx);

		let mut partials: Vec<(usize, Self)> = rx.iter().collect();
		partials.sort_unstable_by_key(|(index, _)| *index);

		let mut models = Self {
			first_order: MarkovModel::new(Order::First),
			second_order: MarkovModel::new(Order::Second),
		};
		for (_, partial) in &partials {
			models.first_order.merge(&partial.first_order)?;
			models.second_order.merge(&partial.second_order)?;
		}

		Ok(models)
	}

	fn build_chunk(tokens: &[String], start: usize, end: usize) -> Self {
		let end = end.min(tokens.len());
		let first_end = (end + 1).min(tokens.len());
		let second_end = (end + 2).min(tokens.len());
		Self {
			first_order: MarkovModel::build(&tokens[start..first_end], Order::First),
			second_order: MarkovModel::build(&tokens[start..second_end], Order::Second),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use std::io::Write;
	use tempfile::TempDir;

	fn assert_models_equal(left: &MarkovModel, right: &MarkovModel) {
		assert_eq!(left.len(), right.len());
		for context in left.contexts() {
			assert_eq!(left.successors_of(context), right.successors_of(context), "context '{context}'");
		}
	}

	#[test]
	fn parallel_build_matches_sequential_build() {
		let words = ["sun", "rain", "moon", "frog", "pond", "leaf", "mist"];
		let tokens: Vec<String> = (0..500)
			.map(|i| words[(i * 7 + i * i) % words.len()].to_owned())
			.collect();

		let sequential = TrainedModels::build(&tokens);
		let parallel = TrainedModels::build_parallel(&tokens).unwrap();

		assert_models_equal(&sequential.first_order, &parallel.first_order);
		assert_models_equal(&sequential.second_order, &parallel.second_order);
	}

	#[test]
	fn load_writes_and_reuses_the_cache() {
		let dir = TempDir::new().expect("temp dir");
		let corpus_path = dir.path().join("corpus.txt");
		let mut file = fs::File::create(&corpus_path).unwrap();
		writeln!(file, "the cat sat on the mat").unwrap();
		drop(file);

		let built = TrainedModels::load(&corpus_path).unwrap();
		assert!(dir.path().join("corpus.bin").exists());
		assert_eq!(built.first_order.successors_of("the"), ["cat", "mat"]);

		// Second load must come from the cache and agree with the build
		let cached = TrainedModels::load(&corpus_path).unwrap();
		assert_models_equal(&built.first_order, &cached.first_order);
		assert_models_equal(&built.second_order, &cached.second_order);
	}
}
