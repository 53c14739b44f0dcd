use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};
use update_ipmi_cert::workflow::EXIT_FAILED;
use update_ipmi_cert::{
    Credentials, Error, RebootStatus, Session, UpdaterConfig, Variant, Workflow,
};

const EXIT_STATUS_HELP: &str = "Exit status:
  0  certificate replaced (and the IPMI rebooted unless --no-reboot)
  1  certificate replaced, but the IPMI did not confirm the reboot
  2  anything else failed; the certificate may not have been replaced";

/// Update Supermicro IPMI SSL certificate
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, after_help = EXIT_STATUS_HELP)]
struct Args {
    /// Supermicro IPMI 2.0 URL
    #[arg(long)]
    ipmi_url: String,

    /// X.509 private key filename
    #[arg(long)]
    key_file: PathBuf,

    /// X.509 certificate filename
    #[arg(long)]
    cert_file: PathBuf,

    /// IPMI username with admin access
    #[arg(long, env = "IPMI_USERNAME")]
    username: String,

    /// IPMI user password
    #[arg(long, env = "IPMI_PASSWORD", hide_env_values = true)]
    password: String,

    /// Controller generation
    #[arg(long, value_enum, default_value_t = Variant::X10)]
    model: Variant,

    /// Don't reboot the IPMI after upload. The new certificate is not served until it
    /// restarts. Without this flag a failed reboot exits with status 1.
    #[arg(long)]
    no_reboot: bool,

    /// Log level (0: quiet, 1: info, 2: debug)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    log_level: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.log_level {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .init();

    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

fn require_file(flag: &'static str, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::MissingFile {
            flag,
            path: path.display().to_string(),
        }
        .into());
    }
    Ok(())
}

fn run(args: Args) -> Result<u8> {
    require_file("--key-file", &args.key_file)?;
    require_file("--cert-file", &args.cert_file)?;
    let config = UpdaterConfig::new(&args.ipmi_url, args.model)?;

    let key = fs::read(&args.key_file)
        .with_context(|| format!("reading {}", args.key_file.display()))?;
    let cert = fs::read(&args.cert_file)
        .with_context(|| format!("reading {}", args.cert_file.display()))?;

    let session = Session::new(config).context("building HTTP client")?;
    let credentials = Credentials {
        username: args.username,
        password: args.password,
    };
    let workflow = Workflow::new(session, credentials, &cert, key, !args.no_reboot);

    let report = workflow.run()?;
    if let RebootStatus::Failed(_) = report.reboot {
        warn!("certificate was replaced but the controller did not reboot");
    } else {
        info!("all done");
    }
    Ok(report.exit_code())
}
