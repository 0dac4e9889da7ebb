//! `lospanel` command-line entry point

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use lospanel_host::cli::{Cli, Commands, PayloadKind};
use lospanel_host::config::{self, HostConfig};
use lospanel_host::smoke::{
    build_fill_burst, build_probe_sequence, build_stress_burst, hex_dump, run_capture, run_probe,
};
use lospanel_host::{ClockDriver, SerialLink, StdDelay};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = config::load(cli.config.as_deref()).context("loading configuration")?;
    cli.command.apply(&mut config);

    match &cli.command {
        Commands::Clock(_) => clock(&config),
        Commands::Fill(_) => capture(&config, "fill", build_fill_burst(config.smoke.fill)),
        Commands::Stress(_) => capture(&config, "stress", build_stress_burst(config.smoke.fill)),
        Commands::Probe(args) => probe(&config, args.backlight),
        Commands::Dump(args) => dump(&config, args.payload),
    }
}

fn open(config: &HostConfig) -> Result<SerialLink> {
    let port = config.port()?;
    let serial = config.serial_config()?;
    info!("opening {} @ {} baud", port, serial.baudrate);
    let link = SerialLink::open(port, &serial)?;
    Ok(link)
}

fn clock(config: &HostConfig) -> Result<()> {
    // Validate everything before touching the port
    let face = config.clock_face()?;
    let wall_clock = config.system_clock()?;

    let link = open(config)?;
    let mut driver = ClockDriver::new(
        link,
        StdDelay,
        wall_clock,
        face,
        config.staging_policy(),
        config.clock_options(),
    );
    driver
        .run(None, config.clock.ticks)
        .context("clock stopped")?;
    Ok(())
}

fn capture(config: &HostConfig, label: &str, payload: Vec<u8>) -> Result<()> {
    let options = config.capture_options();
    let policy = config.staging_policy();

    let mut link = open(config)?;
    link.clear_input()?;
    let rx = link.try_clone()?;

    info!(
        "[{}] {} bytes (fill=0x{:02X})",
        label,
        payload.len(),
        config.smoke.fill
    );
    let report = run_capture(&mut link, rx, &mut StdDelay, &policy, &payload, &options)
        .with_context(|| format!("{} burst on {}", label, link.name()))?;
    report.log_verdict(label, &options);
    Ok(())
}

fn probe(config: &HostConfig, backlight: Option<i64>) -> Result<()> {
    let sequence = build_probe_sequence(&config.geometry()?);
    let options = config.probe_options(backlight);
    let policy = config.probe_policy();

    let mut link = open(config)?;
    run_probe(&mut link, &mut StdDelay, &policy, &sequence, &options)
        .with_context(|| format!("glyph probe on {}", link.name()))?;
    Ok(())
}

fn dump(config: &HostConfig, payload: PayloadKind) -> Result<()> {
    let bytes = match payload {
        PayloadKind::Fill => build_fill_burst(config.smoke.fill),
        PayloadKind::Stress => build_stress_burst(config.smoke.fill),
        PayloadKind::Probe => build_probe_sequence(&config.geometry()?).to_bytes(),
    };
    print!("{}", hex_dump(&bytes));
    Ok(())
}
