//! Blueprint trainer CLI.
//!
//! Thin driver around `holdem_engine::cfr::BlueprintTrainer`: loads a YAML
//! run config, trains with a progress bar, writes the strategy file, and
//! can summarize an existing one.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use holdem_engine::blueprint::PolicyFile;
use holdem_engine::cfr::{BlueprintTrainer, TrainerConfig};

#[derive(Parser)]
#[command(name = "blueprint-trainer")]
#[command(about = "Train blueprint strategies with discounted CFR")]
enum Cli {
    /// Train a blueprint strategy.
    Train {
        /// Path to a YAML trainer config (missing fields use defaults).
        #[arg(short, long)]
        config: PathBuf,
        /// Where to write the strategy file.
        #[arg(short, long, default_value = "blueprint.json")]
        output: PathBuf,
    },
    /// Print a strategy file's meta block.
    Inspect {
        /// Path to a strategy file.
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    match Cli::parse() {
        Cli::Train { config, output } => train(&config, &output),
        Cli::Inspect { file } => inspect(&file),
    }
}

fn train(config_path: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn Error>> {
    let yaml = std::fs::read_to_string(config_path)?;
    let config: TrainerConfig = serde_yaml::from_str(&yaml)?;
    config.engine.validate()?;

    let bar = ProgressBar::new(config.iterations);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} iters | {msg}",
    )?);

    let mut trainer = BlueprintTrainer::new(config);
    let file = trainer.run_with_progress(|record| {
        bar.set_position(record.iteration);
        bar.set_message(format!(
            "{} infosets, drift {:.4}, eval {:+.3} bb/hand",
            record.infosets, record.drift, record.eval.aggregate
        ));
    });
    bar.finish();

    file.save(output)?;
    println!(
        "wrote {} ({} infosets, {} iterations, stop: {:?})",
        output.display(),
        file.policy.len(),
        file.meta.iterations,
        file.meta.stop_reason,
    );
    Ok(())
}

fn inspect(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let file = PolicyFile::load(path)?;
    let meta = &file.meta;
    println!("iterations:  {}", meta.iterations);
    println!("seed:        {}", meta.seed);
    println!(
        "game:        {}/{} blinds, {} stacks, {} raise cap",
        meta.small_blind, meta.big_blind, meta.start_stack, meta.max_raises
    );
    println!("abstraction: {}", meta.abstraction_version);
    println!("stop reason: {:?}", meta.stop_reason);
    println!("infosets:    {}", file.policy.len());
    for checkpoint in &meta.checkpoints {
        println!(
            "  iter {:>8}: {} infosets, drift {:.4}, eval {:+.3} bb/hand",
            checkpoint.iteration,
            checkpoint.infosets,
            checkpoint.drift,
            checkpoint.eval.aggregate,
        );
    }
    Ok(())
}
