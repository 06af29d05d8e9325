//=========================================================================
// Storybook — Executable Entry Point
//=========================================================================
//
// Opens a window on a storybook described by a scene file.
//
//   storybook                          bundled sample book
//   storybook --scenes book.json       custom book
//   storybook --page 2 --tps 120       start page, logic rate
//
// Keys: ←/→ turn pages, Home/End jump, Esc resets the book.
//
//=========================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use storybook_engine::core::scene::SceneConfig;
use storybook_engine::EngineBuilder;

const SAMPLE_BOOK: &str = include_str!("../assets/scenes.json");

/// Interactive pop-up storybook
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Scene file (page index → mechanics, combinators, effects).
    /// The bundled sample book is used when omitted.
    #[arg(long, value_name = "PATH")]
    scenes: Option<PathBuf>,

    /// Page shown first.
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Number of pages; defaults to the highest configured page + 1.
    #[arg(long)]
    pages: Option<usize>,

    /// Logic updates per second.
    #[arg(long, default_value_t = 60.0)]
    tps: f64,

    #[arg(long, default_value = "Storybook")]
    title: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.scenes {
        Some(path) => SceneConfig::from_path(path),
        None => SceneConfig::from_json(SAMPLE_BOOK),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Cannot load scenes: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded {} configured pages", config.len());

    if cli.tps <= 0.0 || cli.pages == Some(0) {
        error!("--tps and --pages must be positive");
        return ExitCode::FAILURE;
    }

    let mut builder = EngineBuilder::new(config)
        .with_tps(cli.tps)
        .with_start_page(cli.page)
        .with_title(cli.title);
    if let Some(pages) = cli.pages {
        builder = builder.with_page_count(pages);
    }

    match builder.build().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
