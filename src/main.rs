//! Next Action BI - Recommendation Board & Profitability Metrics
//!
//! Shows recommended next actions as cards, lets a user assign one to a team
//! by email, and previews per-transaction profitability from a sales sheet.

use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use next_action_bi::catalog::ActionCatalog;
use next_action_bi::gui::NextActionApp;
use next_action_bi::settings::AppSettings;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Next Action BI dashboard")]
struct Cli {
    /// Path to the TOML settings file.
    #[arg(short, long, default_value = "next_action_bi.toml")]
    config: PathBuf,

    /// Sales dataset to open, overriding the settings file.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Action catalog JSON, overriding the settings file.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = AppSettings::load(&cli.config)
        .with_context(|| format!("failed to read settings from {}", cli.config.display()))?;
    if let Some(data) = cli.data {
        settings.data_path = data;
    }
    if let Some(catalog) = cli.catalog {
        settings.catalog_path = Some(catalog);
    }

    let catalog = match &settings.catalog_path {
        Some(path) => ActionCatalog::from_path(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => ActionCatalog::builtin(),
    };

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Next Action BI"),
        ..Default::default()
    };

    tracing::info!(data = %settings.data_path.display(), "starting dashboard");

    // Run the application
    eframe::run_native(
        "Next Action BI",
        options,
        Box::new(move |cc| Ok(Box::new(NextActionApp::new(cc, settings, catalog)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}
