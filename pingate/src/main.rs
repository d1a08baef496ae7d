//! pingate terminal front end.
//!
//! Stands in for the PIN screen: asks for a new PIN on first run, asks for
//! the enrolled PIN afterwards, shows the remaining attempts and clears all
//! data once they are exhausted.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pingate::{
    load_config, Attempt, CredentialGate, ExitProcess, FileStore, GateState, PinGateError,
    WipeScheduler, WipeTicket,
};

/// Local PIN gate
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding the encrypted store
    #[arg(long, default_value = ".pingate")]
    data_dir: PathBuf,

    /// Gate configuration file (defaults to <data-dir>/gate.json)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set the PIN on first run, otherwise ask for it
    Unlock,
    /// Print the gate status as JSON
    Status,
    /// Wipe the PIN, the key and all other stored data
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pingate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| args.data_dir.join("gate.json"));
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let store = Arc::new(
        FileStore::open(&args.data_dir)
            .with_context(|| format!("Failed to open store in {:?}", args.data_dir))?,
    );
    let wiper = WipeScheduler::from_current(config.wipe_delay(), Arc::new(ExitProcess::default()))?;
    let mut gate = CredentialGate::open(store, config, wiper)?;

    match args.command {
        Command::Unlock => unlock(&mut gate).await,
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&gate.status()?)?);
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("Refusing to wipe application data without --yes");
            }
            gate.reset()?;
            println!("All application data cleared.");
            Ok(())
        }
    }
}

async fn unlock(gate: &mut CredentialGate<FileStore>) -> Result<()> {
    match gate.state() {
        GateState::Enroll => enroll(gate),
        GateState::LockedOut => {
            println!("Clearing data and closing application...");
            match gate.pending_wipe() {
                Some(ticket) => finish_wipe(ticket).await,
                None => Ok(()),
            }
        }
        GateState::AwaitingInput | GateState::Unlocked => verify(gate).await,
    }
}

fn enroll(gate: &mut CredentialGate<FileStore>) -> Result<()> {
    println!("Set PIN");
    loop {
        let Some(pin) = prompt("New PIN: ")? else {
            bail!("No PIN entered");
        };
        let Some(confirm) = prompt("Confirm PIN: ")? else {
            bail!("No PIN entered");
        };

        if pin != confirm {
            println!("The confirmation PIN does not match.");
            continue;
        }

        match gate.enroll(&pin) {
            Ok(()) => {
                println!("PIN saved.");
                return Ok(());
            }
            Err(e) if e.is_retryable() => println!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }
}

async fn verify(gate: &mut CredentialGate<FileStore>) -> Result<()> {
    println!("Enter PIN");
    loop {
        let Some(pin) = prompt("PIN: ")? else {
            bail!("No PIN entered");
        };

        match gate.submit(&pin) {
            Ok(Attempt::Granted) => {
                println!("Access granted.");
                return Ok(());
            }
            Ok(Attempt::Rejected { attempts_left }) => {
                println!("Attempts left ({})", attempts_left);
                println!("Once attempts are exhausted, the app resets.");
            }
            Ok(Attempt::LockedOut(ticket)) => {
                println!("Attempts left (0)");
                println!("Clearing data and closing application...");
                info!("Waiting for wipe to complete");
                return finish_wipe(ticket).await;
            }
            Err(PinGateError::EmptySecret) => println!("Please enter a PIN"),
            Err(e) => return Err(e.into()),
        }
    }
}

async fn finish_wipe(ticket: WipeTicket) -> Result<()> {
    match ticket.wait().await {
        Some(report) if report.cleared => Ok(()),
        Some(report) => {
            eprintln!("Failed to clear application data.");
            bail!("Wipe at {} did not clear the store", report.wiped_at)
        }
        None => bail!("Wipe task ended before reporting"),
    }
}

/// Read one trimmed line from stdin, `None` on end of input.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
