use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::io;

/// Failure to resolve a word to a syllable count.
///
/// Corpus tokens are expected to be a subset of dictionary coverage
/// (extended by the override list for gaps), so hitting this during
/// generation is a contract violation, not an expected runtime case.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyllableError {
	#[error("'{0}' has no syllable-count entry in the dictionary")]
	UnknownWord(String),
}

#[derive(Debug, Error)]
pub enum DictionaryError {
	#[error("failed to read dictionary: {0}")]
	Io(#[from] std::io::Error),
	#[error("bad override entry '{0}': expected 'WORD COUNT'")]
	BadOverride(String),
}

/// Immutable mapping from a normalized word (uppercase, possessive suffix
/// stripped) to its syllable count.
///
/// Built once at startup from two sources merged in order: a large phonetic
/// dictionary first, then a small manual override list whose entries replace
/// any existing entry for the same key.
#[derive(Debug, Clone)]
pub struct SyllableDictionary {
	counts: HashMap<String, usize>,
}

impl SyllableDictionary {
	/// Loads the dictionary from a phonetic dictionary file and an override file.
	///
	/// # Formats
	/// - Phonetic dictionary: `WORD <whitespace-separated phoneme codes>`,
	///   one entry per line; the syllable count is the number of phoneme
	///   codes ending in a stress digit. Lines starting with `;;;` are
	///   comments and skipped.
	/// - Overrides: `WORD COUNT`, one entry per line, last-write-wins over
	///   the phonetic entries.
	pub fn load<PD, PO>(phonetic_path: PD, overrides_path: PO) -> Result<Self, DictionaryError>
	where
		PD: AsRef<Path>,
		PO: AsRef<Path>,
	{
		let mut counts = HashMap::new();

		for line in io::read_lines(phonetic_path)? {
			if line.is_empty() || line.starts_with(";;;") {
				continue;
			}
			let mut parts = line.split_whitespace();
			let Some(word) = parts.next() else { continue };
			let syllables = parts.filter(|p| p.ends_with(|c: char| c.is_ascii_digit())).count();
			counts.insert(word.to_owned(), syllables);
		}
		info!("loaded {} phonetic dictionary entries", counts.len());

		for line in io::read_lines(overrides_path)? {
			if line.trim().is_empty() {
				continue;
			}
			let mut parts = line.split_whitespace();
			let entry = parts
				.next()
				.zip(parts.next().and_then(|c| c.parse::<usize>().ok()));
			match entry {
				Some((word, syllables)) => counts.insert(word.to_owned(), syllables),
				None => return Err(DictionaryError::BadOverride(line)),
			};
		}
		info!("{} entries after overrides", counts.len());

		Ok(Self { counts })
	}

	/// Builds a dictionary from in-memory entries. Intended for tests and
	/// small synthetic vocabularies.
	pub fn from_entries(entries: &[(&str, usize)]) -> Self {
		Self {
			counts: entries
				.iter()
				.map(|(word, syllables)| ((*word).to_owned(), *syllables))
				.collect(),
		}
	}

	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Counts the syllables of a word or a hyphenated/space-separated phrase.
	///
	/// Splits the input on hyphens and whitespace, uppercases each part and
	/// strips a trailing `'S` possessive before lookup (the possessive itself
	/// contributes zero syllables, matching the source corpus's convention),
	/// then sums the per-word counts.
	///
	/// # Errors
	/// `UnknownWord` if any part has no dictionary entry.
	pub fn syllables_of(&self, phrase: &str) -> Result<usize, SyllableError> {
		let mut total = 0;
		for word in phrase.split(['-', ' ', '\t']).filter(|w| !w.is_empty()) {
			let word = word.to_uppercase();
			let key = word.strip_suffix("'S").unwrap_or(&word);
			total += self
				.counts
				.get(key)
				.ok_or_else(|| SyllableError::UnknownWord(word.clone()))?;
		}
		Ok(total)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn write_file(lines: &[&str]) -> NamedTempFile {
		let mut file = NamedTempFile::new().expect("temp file");
		for line in lines {
			writeln!(file, "{line}").unwrap();
		}
		file
	}

	#[test]
	fn counts_stress_digits_in_phoneme_lines() {
		let phonetic = write_file(&[
			";;; some header comment",
			"CAT  K AE1 T",
			"IDEA  AY0 D IY1 AH0",
			"RHYTHM  R IH1 DH AH0 M",
		]);
		let overrides = write_file(&[]);
		let dict = SyllableDictionary::load(phonetic.path(), overrides.path()).unwrap();

		assert_eq!(dict.syllables_of("cat").unwrap(), 1);
		assert_eq!(dict.syllables_of("idea").unwrap(), 3);
		assert_eq!(dict.syllables_of("rhythm").unwrap(), 2);
	}

	#[test]
	fn overrides_replace_phonetic_entries() {
		let phonetic = write_file(&["CAT  K AE1 T"]);
		let overrides = write_file(&["CAT 3", "SHINJUKU 3"]);
		let dict = SyllableDictionary::load(phonetic.path(), overrides.path()).unwrap();

		assert_eq!(dict.syllables_of("cat").unwrap(), 3);
		assert_eq!(dict.syllables_of("shinjuku").unwrap(), 3);
	}

	#[test]
	fn bad_override_line_is_an_error() {
		let phonetic = write_file(&["CAT  K AE1 T"]);
		let overrides = write_file(&["CAT three"]);
		assert!(matches!(
			SyllableDictionary::load(phonetic.path(), overrides.path()),
			Err(DictionaryError::BadOverride(_))
		));
	}

	#[test]
	fn possessive_suffix_adds_no_syllable() {
		let dict = SyllableDictionary::from_entries(&[("CAT", 1)]);
		assert_eq!(dict.syllables_of("cat's").unwrap(), 1);
		assert_eq!(dict.syllables_of("CAT'S").unwrap(), 1);
	}

	#[test]
	fn phrases_split_on_hyphens_and_whitespace() {
		let dict = SyllableDictionary::from_entries(&[("WELL", 1), ("KNOWN", 1), ("IDEA", 3)]);
		assert_eq!(dict.syllables_of("well-known").unwrap(), 2);
		assert_eq!(dict.syllables_of("well known idea").unwrap(), 5);
		assert_eq!(dict.syllables_of("").unwrap(), 0);
	}

	#[test]
	fn unknown_word_is_reported() {
		let dict = SyllableDictionary::from_entries(&[("CAT", 1)]);
		assert_eq!(
			dict.syllables_of("cat zephyr"),
			Err(SyllableError::UnknownWord("ZEPHYR".to_owned()))
		);
	}
}
