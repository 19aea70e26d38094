mod cli;
mod commands;

use std::io::{self, BufWriter, Write};

use clap::Parser;
use cli::{Cli, Commands};
use commands::TrainOptions;

fn init_tracing(cli: &Cli) {
    //   --quiet   → "off"
    //   --verbose → RUST_LOG, else "info"
    //   default   → RUST_LOG, else "warn"
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> lemmatizer::Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Commands::Print { models } => commands::print(&models, &mut out)?,
        Commands::PrintKeys { models } => commands::print_keys(&models, &mut out)?,
        Commands::Train {
            input,
            output,
            classes,
            reverse,
            ignore_case,
            threshold,
            prune,
        } => {
            let opts = TrainOptions {
                classes,
                reverse,
                ignore_case,
                threshold,
                prune,
            };
            commands::train(&input, &output, &opts, &mut out)?
        }
        Commands::Classify { model, words } => {
            let words = commands::words_or_stdin(words)?;
            commands::classify(&model, &words, &mut out)?
        }
        Commands::Lemmatize { models, pos, words } => {
            let words = commands::words_or_stdin(words)?;
            commands::lemmatize(&models, pos, &words, &mut out)?
        }
    }

    out.flush()?;
    Ok(())
}
