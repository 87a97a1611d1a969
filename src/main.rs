use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aggregate;
mod config;
mod error;
mod psd;
mod recording;
mod select;
mod types;
mod ui;

#[cfg(test)]
mod testutil;

use aggregate::compute_class;
use config::Config;
use select::select_files;
use types::{Class, ClassAggregate};
use ui::App;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ieeg_psd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::parse();
    info!("Scanning {}", config.data_path.display());

    let (ictal, interictal) = compare(&config)?;

    if config.summary_only {
        return Ok(());
    }

    let mut app = App::new(ictal, interictal, config.data_path.display().to_string());
    ui::show(&mut app).context("Failed to display PSD chart")?;
    Ok(())
}

/// Select, load and average both classes.
fn compare(config: &Config) -> Result<(ClassAggregate, ClassAggregate)> {
    let ictal = class_aggregate(config, Class::Ictal)?;
    let interictal = class_aggregate(config, Class::Interictal)?;
    Ok((ictal, interictal))
}

fn class_aggregate(config: &Config, class: Class) -> Result<ClassAggregate> {
    let files = select_files(&config.data_path, class.marker())?;
    let aggregate = compute_class(&config.data_path, &files, class, config.jobs.get())
        .with_context(|| format!("Failed to compute {} PSD", class.marker()))?;

    info!(
        "{}: {} files, {} bins at {:.2} Hz resolution",
        class.label(),
        aggregate.file_count,
        aggregate.curve.len(),
        aggregate.curve.resolution()
    );
    Ok(aggregate)
}
