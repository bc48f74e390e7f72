use std::io::{self, BufRead};
use std::time::Instant;

use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use haiku_gen_core::model::generator::HaikuGenerator;
use haiku_gen_core::model::training::TrainedModels;
use haiku_gen_core::syllable::SyllableDictionary;

const DICTIONARY_PATH: &str = "data/cmudict-0.7b.txt";
const OVERRIDES_PATH: &str = "data/missing_words.txt";
const CORPUS_PATH: &str = "data/haiku_training_data.txt";

fn main() -> Result<(), Box<dyn std::error::Error>> {
	init_tracing();

	let dictionary = SyllableDictionary::load(DICTIONARY_PATH, OVERRIDES_PATH)?;

	let start = Instant::now();
	let models = TrainedModels::load(CORPUS_PATH)?;
	info!("models ready in {} ms", start.elapsed().as_millis());

	let generator = HaikuGenerator::new(models, dictionary);
	let mut rng = rand::rng();

	let stdin = io::stdin();
	let mut answers = stdin.lock().lines();

	println!("\nReady for haikus? (y/n)");
	if !confirmed(&mut answers)? {
		return Ok(());
	}

	loop {
		let haiku = generator.generate(&mut rng)?;
		for line in haiku.lines() {
			println!("{line}");
		}

		println!("\nYou want more? (y/n)");
		if !confirmed(&mut answers)? {
			break;
		}
	}

	Ok(())
}

/// Reads one answer; only an explicit `n` (or end of input) declines.
fn confirmed(answers: &mut impl Iterator<Item = io::Result<String>>) -> io::Result<bool> {
	match answers.next() {
		Some(answer) => Ok(answer?.trim() != "n"),
		None => Ok(false),
	}
}

fn init_tracing() {
	let env_filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new("info"))
		.unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_target(false)
		.with_level(true)
		.with_max_level(Level::INFO)
		.init();
}
