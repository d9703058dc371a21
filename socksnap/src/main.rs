use std::{
    fs::OpenOptions,
    io::{self, BufWriter, Write},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

mod bindings;
mod cli;
mod collect;
mod core;
mod helpers;

use crate::{
    cli::{Cli, CliDisplayFormat},
    collect::{PrintEvent, PrintEventFormat, Sampler},
    helpers::{daemon::daemonize, logger::Logger, signals::Running},
};

// Re-export events crate. It's not really an import but a re-export so events appear as module
// inside the crate rather than an external crate. However, clippy doesn't like it.
#[allow(clippy::single_component_path_imports)]
use events;

fn main() -> Result<()> {
    let cli = Cli::parse();
    Logger::init(cli.log_level()?)?;

    if !cli.foreground {
        daemonize().context("failed to daemonize")?;
    }

    // The signal watcher thread must only be spawned once the daemon fork
    // is done.
    let run = Running::new()?;

    let sink: Box<dyn Write> = Box::new(BufWriter::new(
        OpenOptions::new()
            .write(true)
            .open(&cli.pipe_path)
            .with_context(|| format!("could not open output sink '{}'", cli.pipe_path.display()))?,
    ));

    let mut printers = Vec::new();
    if cli.print {
        printers.push(PrintEvent::new(
            Box::new(io::stdout()),
            match cli.format {
                CliDisplayFormat::Text => PrintEventFormat::Text,
                CliDisplayFormat::Json => PrintEventFormat::Json,
            },
        ));
    }

    info!(
        "Sampling socket tables every {} us, writing to {}",
        cli.interval,
        cli.pipe_path.display()
    );

    Sampler::new(Duration::from_micros(cli.interval), run, sink, printers).run()
}
