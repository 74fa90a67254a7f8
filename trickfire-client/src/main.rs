// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

use std::sync::Arc;

use clap::{Parser, ValueHint};
use trickfire::strategy::StrategyKind;

#[derive(Parser)]
#[command(author = "Copyright (C) 2024 Laixer Equipment B.V.")]
#[command(version, propagate_version = true)]
#[command(about = "TrickFire robot client daemon", long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(
        long = "config",
        default_value = "/etc/trickfire.conf",
        value_hint = ValueHint::FilePath
    )]
    config: std::path::PathBuf,
    /// Control station network address.
    #[arg(short = 'c', long = "connect")]
    address: Option<String>,
    /// Enable vision guided driving.
    #[arg(long)]
    vision: bool,
    /// Show the drive telemetry on the terminal.
    #[arg(long)]
    telemetry: bool,
    /// Strategy selected by the autonomous mode packet.
    #[arg(long, value_parser = ["scripted", "vision"])]
    auto_strategy: Option<String>,
    /// Quiet output (no logging).
    #[arg(long)]
    quiet: bool,
    /// Daemonize the service.
    #[arg(short = 'D', long)]
    daemon: bool,
    /// Level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use log::LevelFilter;

    let args = Args::parse();

    let mut log_config = simplelog::ConfigBuilder::new();
    if args.daemon {
        log_config.set_time_level(log::LevelFilter::Off);
        log_config.set_thread_level(log::LevelFilter::Off);
    }

    log_config.set_target_level(log::LevelFilter::Off);
    log_config.set_location_level(log::LevelFilter::Off);
    log_config.add_filter_ignore_str("mio");

    let log_level = if args.daemon {
        LevelFilter::Info
    } else if args.quiet {
        LevelFilter::Off
    } else {
        match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let color_choice = if args.daemon {
        simplelog::ColorChoice::Never
    } else {
        simplelog::ColorChoice::Auto
    };

    simplelog::TermLogger::init(
        log_level,
        log_config.build(),
        simplelog::TerminalMode::Mixed,
        color_choice,
    )?;

    if args.daemon {
        log::debug!("Running service as daemon");
    }

    let mut config = trickfire::Config::from_file(&args.config)?;

    if let Some(address) = args.address {
        config.connect = address;
    }
    if args.vision {
        config.vision.enabled = true;
    }
    if args.telemetry {
        config.telemetry.enabled = true;
    }
    if let Some(auto_strategy) = args.auto_strategy {
        config.drive.auto_strategy = auto_strategy.parse::<StrategyKind>()?;
    }

    config.validate()?;

    log::trace!("{:#?}", config);
    log::info!("{}", config);

    log::info!("TrickFire client {}", trickfire::consts::VERSION);

    let hardware = Arc::new(trickfire::device::SimulatedIo::new());
    let transport = trickfire::transport::TcpTransport::new(config.address());

    let controller = trickfire::lifecycle::LifecycleController::new(config, hardware, transport);

    controller.context().enable_term_shutdown();

    controller.run().await?;

    Ok(())
}
