#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use pci_quirks::{ControlFile, PcibackPaths, RunError, SysfsResolver};
use tracing_subscriber::EnvFilter;

const EXIT_USAGE: i32 = 1;
const EXIT_FAILURE: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "pciback-quirks",
    version,
    about = "Grant config-space write quirks to PCI devices bound to Xen pciback, as listed in a JSON rule file."
)]
struct Args {
    /// JSON quirk rule file.
    rules: PathBuf,

    /// pciback slots listing (default: $PCIBACK_SLOTS_FILE or /sys/bus/pci/drivers/pciback/slots).
    #[arg(long, value_name = "PATH")]
    slots: Option<PathBuf>,

    /// pciback quirks control file (default: $PCIBACK_QUIRKS_FILE or /sys/bus/pci/drivers/pciback/quirks).
    #[arg(long, value_name = "PATH")]
    quirks: Option<PathBuf>,

    /// Directory holding per-device sysfs entries (default: $PCI_DEVICES_DIR or /sys/bus/pci/devices).
    #[arg(long, value_name = "DIR")]
    devices_dir: Option<PathBuf>,
}

impl Args {
    fn paths(&self) -> PcibackPaths {
        let env = PcibackPaths::from_env();
        PcibackPaths {
            slots: self.slots.clone().unwrap_or(env.slots),
            quirks: self.quirks.clone().unwrap_or(env.quirks),
            devices_dir: self.devices_dir.clone().unwrap_or(env.devices_dir),
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            std::process::exit(EXIT_USAGE);
        }
    };

    if let Err(err) = run(&args) {
        eprintln!("{err:#}");
        let code = err
            .downcast_ref::<RunError>()
            .map_or(EXIT_FAILURE, RunError::exit_code);
        std::process::exit(code);
    }
}

fn run(args: &Args) -> Result<()> {
    let paths = args.paths();
    tracing::debug!(?paths, rules = %args.rules.display(), "starting quirk pass");

    let resolver = SysfsResolver::new(&paths.devices_dir);
    let mut control = ControlFile::new(&paths.quirks);

    let report = pci_quirks::run(&args.rules, &paths.slots, &resolver, &mut control)
        .with_context(|| format!("apply quirks from {}", args.rules.display()))?;

    if report.rejected + report.failed > 0 {
        tracing::warn!(
            rejected = report.rejected,
            failed = report.failed,
            "some quirks were not applied"
        );
    }
    println!(
        "Added a total of {} quirks to {}",
        report.applied,
        paths.quirks.display()
    );
    Ok(())
}
