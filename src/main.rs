use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use gridfill::{
    Backtracking, Cancellation, CrosswordSolver, ProgressListener, PuzzleGrid, SolverConfig,
    ValueSelection,
};
use log::info;

#[derive(Debug, Parser)]
struct Cli {
    /// The grid template: one line per row, `.` for an empty box, `#` for a shaded box and any
    /// other character for a pre-filled letter.
    template: PathBuf,

    /// The dictionary, one word per line.
    words: PathBuf,

    /// How to pick the word for a slot.
    #[arg(short = 'V', long = "value-selection", value_enum, default_value_t)]
    value_selection: ValueSelectionArg,

    /// How to recover from a slot that can't be filled.
    #[arg(short = 'B', long = "backtracking", value_enum, default_value_t)]
    backtracking: BacktrackingArg,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ValueSelectionArg {
    #[default]
    LeastConstraining,
    FirstViable,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum BacktrackingArg {
    #[default]
    Dynamic,
    Chronological,
    Backjump,
}

/// Logs the solver's progress.
struct LogProgress;

impl ProgressListener for LogProgress {
    fn on_initialisation_start(&mut self) {
        info!("Building the grid and the dictionary");
    }

    fn on_initialisation_end(&mut self) {
        info!("Starting the search");
    }

    fn on_progress(&mut self, percentage: u8) {
        info!("{}% of the slots filled", percentage);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();

    let template = std::fs::read_to_string(&args.template)
        .with_context(|| format!("Error reading {}", args.template.display()))?;
    let puzzle = PuzzleGrid::from_template(&template)
        .with_context(|| format!("Invalid grid in {}", args.template.display()))?;

    let words = std::fs::read_to_string(&args.words)
        .with_context(|| format!("Error reading {}", args.words.display()))?;
    let words: Vec<&str> = words
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let config = SolverConfig::default()
        .with_value_selection(match args.value_selection {
            ValueSelectionArg::LeastConstraining => ValueSelection::LeastConstraining,
            ValueSelectionArg::FirstViable => ValueSelection::FirstViable,
        })
        .with_backtracking(match args.backtracking {
            BacktrackingArg::Dynamic => Backtracking::Dynamic,
            BacktrackingArg::Chronological => Backtracking::Chronological,
            BacktrackingArg::Backjump => Backtracking::Backjump,
        });

    let result = CrosswordSolver::new(config).solve_with(
        &puzzle,
        &words,
        &mut LogProgress,
        vec![],
        &Cancellation::new(),
    )?;

    print!("{}", result);

    Ok(())
}
