use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::io;

#[derive(Debug, Error)]
pub enum CorpusError {
	#[error("failed to read corpus: {0}")]
	Io(#[from] std::io::Error),
}

/// Splits free text into corpus tokens.
///
/// Hyphens are treated as word separators (a hyphenated compound
/// contributes multiple tokens), repeated whitespace collapses, and
/// leading/trailing non-word characters are stripped from each token.
/// Case is preserved; syllable lookups normalize on their side.
pub fn tokenize(text: &str) -> Vec<String> {
	text.replace('-', " ")
		.split_whitespace()
		.map(|token| token.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
		.filter(|token| !token.is_empty())
		.map(str::to_owned)
		.collect()
}

/// Reads a training-corpus file and tokenizes it.
pub fn load_tokens<P: AsRef<Path>>(path: P) -> Result<Vec<String>, CorpusError> {
	let tokens = tokenize(&io::read_text(path)?);
	info!("tokenized {} corpus tokens", tokens.len());
	Ok(tokens)
}
