//! DMA Locker CLI - lock and unlock folders in place.
//!
//! Every file under a folder is encrypted into a `.dma` container next to
//! it, or restored from one. The password and second-factor secret are
//! enrolled once with `setup`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use dmalock_app::{base_dir, settings_path, Locker, Settings};
use dmalock_common::Error;
use dmalock_pipeline::{BatchEvent, BatchHandle, RemovalPolicy};

#[derive(Parser)]
#[command(name = "dmalock")]
#[command(about = "DMA Locker - Encrypt folders in place")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll the password and an authenticator secret.
    Setup,

    /// Encrypt every file in a folder.
    Lock {
        /// Folder to lock.
        dir: PathBuf,
    },

    /// Decrypt every locked file in a folder.
    Unlock {
        /// Folder to unlock.
        dir: PathBuf,

        /// Authenticator code (prompted if omitted).
        #[arg(short, long)]
        code: Option<String>,
    },

    /// Show what a folder holds and whether setup has run.
    Status {
        /// Folder to inspect.
        dir: PathBuf,
    },

    /// Show or change settings.
    Config {
        /// How originals are removed after locking.
        #[arg(long, value_enum)]
        removal: Option<RemovalArg>,

        /// Authenticator steps (30 s each) accepted on either side of now.
        #[arg(long)]
        skew_steps: Option<u64>,
    },

    /// Delete the enrolled credentials.
    Reset {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RemovalArg {
    /// Move originals to the OS trash.
    Trash,
    /// Delete originals permanently.
    Delete,
}

impl From<RemovalArg> for RemovalPolicy {
    fn from(arg: RemovalArg) -> Self {
        match arg {
            RemovalArg::Trash => RemovalPolicy::Trash,
            RemovalArg::Delete => RemovalPolicy::Delete,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let open = || Locker::open().context("Failed to open locker state");

    match cli.command {
        Commands::Setup => cmd_setup(&open()?),
        Commands::Lock { dir } => cmd_lock(&open()?, &dir).await,
        Commands::Unlock { dir, code } => cmd_unlock(&open()?, &dir, code).await,
        Commands::Status { dir } => cmd_status(&open()?, &dir),
        Commands::Config {
            removal,
            skew_steps,
        } => cmd_config(removal, skew_steps),
        Commands::Reset { yes } => cmd_reset(&open()?, yes),
    }
}

/// Prompt for a secret without echo.
fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let secret = rpassword::prompt_password(prompt).context("Failed to read input")?;
    Ok(Zeroizing::new(secret))
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn not_configured_hint(error: Error) -> anyhow::Error {
    match error {
        Error::CredentialStoreUnavailable(_) => {
            anyhow::anyhow!("Not configured yet. Run `dmalock setup` first.")
        }
        other => anyhow::Error::new(other),
    }
}

/// Enroll credentials.
fn cmd_setup(locker: &Locker) -> Result<ExitCode> {
    if locker.is_configured() {
        info!("Existing credentials will be replaced");
    }

    let password = prompt_secret("Enter password: ")?;
    let confirmation = prompt_secret("Confirm password: ")?;

    let provisioning = locker
        .setup(&password, &confirmation)
        .context("Setup failed")?;

    println!("Setup complete.");
    println!();
    println!("Add this account to your authenticator app:");
    println!("  {}", provisioning.enrollment_uri);
    println!("  Secret: {}", provisioning.secret_base32());
    println!();
    println!("The code will be asked for on every unlock.");

    Ok(ExitCode::SUCCESS)
}

/// Lock a folder.
async fn cmd_lock(locker: &Locker, dir: &Path) -> Result<ExitCode> {
    info!("Locking {}", dir.display());

    let handle = locker.lock(dir).map_err(not_configured_hint)?;
    follow(handle).await
}

/// Unlock a folder.
async fn cmd_unlock(locker: &Locker, dir: &Path, code: Option<String>) -> Result<ExitCode> {
    info!("Unlocking {}", dir.display());

    let code = match code {
        Some(code) => Some(Zeroizing::new(code)),
        None if locker.requires_second_factor() => {
            Some(prompt_secret("Authenticator code (6 digits): ")?)
        }
        None => None,
    };

    let handle = match locker.unlock(dir, code.as_deref().map(String::as_str)) {
        Ok(handle) => handle,
        Err(Error::SecondFactorRejected) => {
            eprintln!("Access denied: wrong or expired code.");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(not_configured_hint(e)),
    };
    follow(handle).await
}

/// Print batch events until the batch finishes.
async fn follow(mut handle: BatchHandle) -> Result<ExitCode> {
    let token = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    while let Some(event) = handle.next_event().await {
        match event {
            BatchEvent::Started { .. } => {}
            BatchEvent::Progress {
                percent, message, ..
            } => println!("[{:>3}%] {}", percent, message),
            BatchEvent::Finished {
                success, message, ..
            } => {
                if success {
                    println!("{}", message);
                } else {
                    eprintln!("{}", message);
                }
            }
        }
    }

    let report = handle.wait().await.context("Batch did not complete")?;
    info!(
        "{} succeeded, {} failed in {:.1?}",
        report.succeeded(),
        report.failed(),
        report.elapsed
    );
    if report.trashed() > 0 {
        info!("{} original(s) moved to the trash", report.trashed());
    }

    Ok(if report.outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Show folder contents and setup state.
fn cmd_status(locker: &Locker, dir: &Path) -> Result<ExitCode> {
    let status = locker
        .status(dir)
        .with_context(|| format!("Failed to inspect {}", dir.display()))?;
    let inventory = &status.inventory;

    println!("Folder: {}", dir.display());
    println!("  Plain files:   {}", inventory.plain);
    println!("  Locked files:  {}", inventory.locked);
    if inventory.unrecognized > 0 {
        println!("  Unrecognized:  {}", inventory.unrecognized);
    }
    if inventory.unreadable > 0 {
        println!("  Unreadable:    {}", inventory.unreadable);
    }
    if !inventory.preview.is_empty() {
        println!("  First files:");
        for path in &inventory.preview {
            println!("    {}", path.display());
        }
        let hidden = inventory.total().saturating_sub(inventory.preview.len());
        if hidden > 0 {
            println!("    ... and {} more", hidden);
        }
    }
    println!(
        "Credentials: {}",
        if status.configured {
            "configured"
        } else {
            "not configured"
        }
    );
    println!(
        "Second factor: {}",
        if status.second_factor {
            "enrolled"
        } else {
            "none"
        }
    );

    Ok(ExitCode::SUCCESS)
}

/// Delete enrolled credentials.
fn cmd_reset(locker: &Locker, yes: bool) -> Result<ExitCode> {
    if !yes && !confirm("Delete the stored password and authenticator secret?")? {
        println!("Aborted.");
        return Ok(ExitCode::FAILURE);
    }

    locker.reset().context("Failed to delete credentials")?;
    println!("Credentials deleted. Locked folders stay locked until setup is rerun with the same password.");

    Ok(ExitCode::SUCCESS)
}

/// Show settings, writing any requested changes first.
fn cmd_config(removal: Option<RemovalArg>, skew_steps: Option<u64>) -> Result<ExitCode> {
    let path = settings_path(&base_dir()?);
    let mut settings = Settings::load(&path).context("Failed to read settings")?;

    if removal.is_some() || skew_steps.is_some() {
        if let Some(removal) = removal {
            settings.removal = removal.into();
        }
        if let Some(skew_steps) = skew_steps {
            settings.totp_skew_steps = skew_steps;
        }
        settings.save(&path).context("Failed to write settings")?;
        settings = Settings::load(&path).context("Failed to read settings")?;
        info!("Settings written to {}", path.display());
    }

    println!("Settings: {}", path.display());
    println!("  removal:         {:?}", settings.removal);
    println!("  totp_issuer:     {}", settings.totp_issuer);
    println!("  totp_account:    {}", settings.totp_account);
    println!("  totp_skew_steps: {}", settings.totp_skew_steps);

    Ok(ExitCode::SUCCESS)
}
