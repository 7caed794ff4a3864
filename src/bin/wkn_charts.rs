use wkn_charts::config::{Config, SupportStyle, VolumeMode};
use wkn_charts::models::style::StyleConfig;
use wkn_charts::paths::base::PathProvider;
use wkn_charts::paths::fixed::FixedPathProvider;
use wkn_charts::services::run_service::{RunOutcome, RunService};

use anyhow::{bail, Context};
use clap::{App, Arg};
use log::{error, info};

#[cfg(feature = "dialogs")]
fn dialog_provider() -> anyhow::Result<Box<dyn PathProvider>> {
    Ok(Box::new(wkn_charts::paths::dialog::DialogPathProvider::new()))
}

#[cfg(not(feature = "dialogs"))]
fn dialog_provider() -> anyhow::Result<Box<dyn PathProvider>> {
    bail!("--input is required when built without the `dialogs` feature")
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("wkn_charts")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Renders one Bollinger/volume chart per WKN from a semicolon-separated table")
        .arg(
            Arg::with_name("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("CSV file to read (skips the file dialog)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Directory for the charts, used together with --input")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("separator")
                .long("separator")
                .value_name("CHAR")
                .help("Field separator")
                .takes_value(true)
                .default_value(";"),
        )
        .arg(
            Arg::with_name("date-column")
                .long("date-column")
                .value_name("NAME")
                .help("Column used as the time axis")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("id-column")
                .long("id-column")
                .value_name("NAME")
                .help("Column used to group rows into charts")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("volume-mode")
                .long("volume-mode")
                .value_name("MODE")
                .help("Volume coloring (auto, split, direction)")
                .takes_value(true)
                .default_value("auto"),
        )
        .arg(
            Arg::with_name("support-style")
                .long("support-style")
                .value_name("STYLE")
                .help("Support markers as vertical date lines or horizontal levels (vertical, horizontal)")
                .takes_value(true)
                .default_value("vertical"),
        )
        .arg(
            Arg::with_name("width")
                .long("width")
                .value_name("PX")
                .help("Image width in pixels")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .value_name("PX")
                .help("Image height in pixels")
                .takes_value(true),
        )
        .get_matches();

    let separator = matches.value_of("separator").unwrap_or(";");
    if separator.len() != 1 {
        bail!("Separator must be a single ASCII character, got '{}'", separator);
    }

    let volume_mode: VolumeMode = matches.value_of("volume-mode").unwrap_or("auto").parse()?;
    let support_style: SupportStyle = matches.value_of("support-style").unwrap_or("vertical").parse()?;

    let mut config = Config::new()
        .with_separator(separator.as_bytes()[0])
        .with_volume_mode(volume_mode)
        .with_support_style(support_style);

    if let Some(column) = matches.value_of("date-column") {
        config = config.with_date_column(column);
    }
    if let Some(column) = matches.value_of("id-column") {
        config = config.with_id_column(column);
    }

    let width = match matches.value_of("width") {
        Some(w) => w.parse::<u32>().context("invalid --width")?,
        None => config.width,
    };
    let height = match matches.value_of("height") {
        Some(h) => h.parse::<u32>().context("invalid --height")?,
        None => config.height,
    };
    config = config.with_size(width, height);

    let paths: Box<dyn PathProvider> = match matches.value_of("input") {
        Some(input) => {
            let mut provider = FixedPathProvider::new(input);
            if let Some(output) = matches.value_of("output") {
                provider = provider.with_output_dir(output);
            }
            Box::new(provider)
        }
        None => dialog_provider()?,
    };

    let service = RunService::new(config, StyleConfig::default(), paths);

    match service.run().context("chart run failed")? {
        RunOutcome::Aborted => {
            info!("Keine Datei gewählt. Beende.");
        }
        RunOutcome::Completed(summary) => {
            info!("Charts gespeichert in: {}", summary.output_dir.display());
            if !summary.is_success() {
                for (entity, message) in &summary.failed {
                    error!("WKN {}: {}", entity, message);
                }
                bail!("{} chart(s) could not be rendered", summary.failed.len());
            }
        }
    }

    Ok(())
}
