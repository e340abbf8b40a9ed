use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use log::error;
use xwordgen::logging::init_logger;
use xwordgen::{
    seed_for_date, to_level_data, GenerateOptions, GeneratorSettings, PuzzleGenerator, TemplateRegistry,
    WordIndex,
};

const USAGE: &str = "usage: xwordgen <word-bank.json> [level] [seed] [--json]";

fn is_debug_mode() -> bool {
    env::var("XWORDGEN_DEBUG").map(|v| v == "1").unwrap_or(false)
}

fn load_settings() -> Result<GeneratorSettings, xwordgen::SettingsError> {
    match env::var("XWORDGEN_SETTINGS") {
        Ok(path) => GeneratorSettings::load_from_path(path),
        Err(_) => Ok(GeneratorSettings::default()),
    }
}

fn main() -> ExitCode {
    init_logger(is_debug_mode());

    let mut args: Vec<String> = env::args().skip(1).collect();
    let json_output = args.iter().any(|arg| arg == "--json");
    args.retain(|arg| arg != "--json");

    let Some(bank_path) = args.first() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let level: u32 = match args.get(1).map(|arg| arg.parse()) {
        None => 1,
        Some(Ok(level)) => level,
        Some(Err(_)) => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    // Without an explicit seed, every run on the same day produces the same puzzle.
    let seed: u64 = match args.get(2).map(|arg| arg.parse()) {
        None => seed_for_date(Local::now().date_naive()),
        Some(Ok(seed)) => seed,
        Some(Err(_)) => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let index = match WordIndex::load_from_path(bank_path) {
        Ok(index) => index,
        Err(err) => {
            error!("Could not load {bank_path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            error!("Could not load settings: {err}");
            return ExitCode::FAILURE;
        }
    };

    let generator = PuzzleGenerator::new(Arc::new(index), Arc::new(TemplateRegistry::builtin()))
        .with_settings(settings);

    let puzzle = match generator.generate(&GenerateOptions::for_level(level).with_seed(seed)) {
        Ok(Some(puzzle)) => puzzle,
        Ok(None) => {
            error!("No puzzle could be generated for level {level} with seed {seed}");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&to_level_data(&puzzle)) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                error!("Could not serialize level: {err}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("{} (level {}, seed {})", puzzle.template_id, puzzle.level, puzzle.seed);
    println!("{}", puzzle.render());
    println!();
    for word in &puzzle.words {
        println!("{:>4}  {} ({})", word.id, word.clue, word.answer.chars().count());
    }
    println!();
    println!(
        "difficulty {:.1}, {} attempts in {} ms",
        puzzle.difficulty_score, puzzle.attempts_used, puzzle.elapsed_ms
    );

    ExitCode::SUCCESS
}
