// chorales - token corpora from BWV Bach chorales
//
// Subcommands:
// - `chorales mono-all-constant-t` - monophonic parts, constant timestep frames
// - `chorales mono-all` - monophonic (pitch, duration) pairs
// - `chorales durations` - durations of every part
// - `chorales poly` - print the chord slices of each score
// - `chorales decode <file.utf>` - print the tokens of an encoded file

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::{error, info, warn};

use chorales::config::Config;
use chorales::corpus::{DirectoryCorpus, ScoreSource};
use chorales::encode::{Durations, Encoder, MonoConstantTimestep, MonoPairs};
use chorales::error::RunError;
use chorales::normalize::normalize_key;
use chorales::poly::chordify;
use chorales::runner::{run, VOCABULARY_FILE};
use chorales::vocabulary::Decoder;
use chorales::voices::canonicalize;

#[derive(Parser)]
#[command(name = "chorales")]
#[command(about = "Constructs various corpora using BWV Bach chorales")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of JSON scores
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Directory the corpus files are written to
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Only process the first N scores
    #[arg(long, global = true)]
    subset: Option<usize>,

    /// Worker threads (defaults to one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepares all monophonic parts, constant timestep between samples
    MonoAllConstantT {
        /// Frames per quarter note
        #[arg(long)]
        frames_per_quarter: Option<u32>,
    },

    /// Prepares all monophonic parts as (pitch, duration) pairs, with major/minor labels
    MonoAll {
        /// Only extract Soprano parts
        #[arg(long)]
        soprano_only: bool,

        /// Use pitch classes, discarding octave information
        #[arg(long)]
        use_pitch_classes: bool,
    },

    /// Prepares a corpus containing durations from all parts
    Durations,

    /// Prints the chord slices of every score, all four parts together
    Poly,

    /// Decodes an encoded file with the vocabulary of its run
    Decode {
        /// A `.utf` file from the output directory
        file: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<Config, RunError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(corpus) = &cli.corpus {
        config.corpus_dir = corpus.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if cli.subset.is_some() {
        config.subset = cli.subset;
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    if let Commands::MonoAllConstantT {
        frames_per_quarter: Some(frames),
    } = &cli.command
    {
        config.frames_per_quarter = *frames;
    }
    config.validate()?;
    Ok(config)
}

fn extract_with(encoder: &dyn Encoder, config: &Config) -> Result<(), RunError> {
    let scores = DirectoryCorpus::new(&config.corpus_dir).scores()?;
    let summary = run(scores, encoder, config.analyzer.analyzer(), config)?;
    info!(
        "Wrote {} sequences to {} ({} tokens, {} scores skipped)",
        summary.units_written,
        config.output_dir.display(),
        summary.vocabulary_size,
        summary.skipped.len()
    );
    Ok(())
}

fn print_chords(config: &Config) -> Result<(), RunError> {
    let scores = DirectoryCorpus::new(&config.corpus_dir).scores()?;
    let limit = config.subset.unwrap_or(usize::MAX);
    for mut score in scores.into_iter().take(limit) {
        let normalized = canonicalize(&mut score)
            .and_then(|_| normalize_key(&mut score, config.analyzer.analyzer()));
        match normalized {
            Ok(key) => {
                println!("{} ({})", score.id, key);
                for slice in chordify(&score) {
                    println!("{}", slice);
                }
            }
            Err(err) => warn!("Skipping {}: {}", score.id, err),
        }
    }
    Ok(())
}

fn decode(file: &Path, config: &Config) -> Result<(), RunError> {
    let decoder = Decoder::load(&config.output_dir.join(VOCABULARY_FILE))?;
    let encoded = fs::read_to_string(file).map_err(|source| RunError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    for token in decoder.decode(&encoded)? {
        println!("{}", token);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = load_config(&cli).and_then(|config| match &cli.command {
        Commands::MonoAllConstantT { .. } => extract_with(
            &MonoConstantTimestep {
                frames_per_quarter: config.frames_per_quarter,
                note_start_marker: config.note_start_marker.clone(),
            },
            &config,
        ),
        Commands::MonoAll {
            soprano_only,
            use_pitch_classes,
        } => extract_with(
            &MonoPairs {
                soprano_only: *soprano_only,
                pitch_classes: *use_pitch_classes,
            },
            &config,
        ),
        Commands::Durations => extract_with(&Durations, &config),
        Commands::Poly => print_chords(&config),
        Commands::Decode { file } => decode(file, &config),
    });

    if let Err(err) = result {
        error!("{}", err);
        process::exit(1);
    }
}
