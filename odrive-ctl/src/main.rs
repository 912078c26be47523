mod diagnostics;
mod integration_control;

use std::path::PathBuf;

use anyhow::Context;
use diagnostics::{MountProbe, print_diagnostics_report};
use integration_control::{detect_integration_status, guided_install_instructions};
use odrive_integrations::{OdriveCli, Settings};

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliMode {
    Status,
    SyncState(PathBuf),
    ShowSettings,
    CheckIntegrations,
    InstallGuided,
    Diagnostics,
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Status;
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        mode = match arg.as_str() {
            "--status" => CliMode::Status,
            "--sync-state" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--sync-state requires a path"))?;
                CliMode::SyncState(PathBuf::from(path))
            }
            "--show-settings" => CliMode::ShowSettings,
            "--check-integrations" => CliMode::CheckIntegrations,
            "--install-guided" => CliMode::InstallGuided,
            "--diagnostics" => CliMode::Diagnostics,
            "--help" | "-h" => {
                print_help();
                return Ok(CliMode::Help);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        };
    }
    Ok(mode)
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    init_logging(&settings);

    let mode = parse_cli_mode(std::env::args())?;
    let cli = OdriveCli::locate(&settings);
    tracing::debug!(?mode, found = cli.is_some(), "odrive-ctl starting");

    match mode {
        CliMode::Help => {}
        CliMode::Status => print_status(cli.as_ref())?,
        CliMode::SyncState(path) => {
            let cli = cli.context("odrive CLI not found; install it or set ODRIVE_CLI")?;
            let path = std::path::absolute(&path)
                .with_context(|| format!("invalid path {}", path.display()))?;
            let report = cli
                .sync_state(&path)
                .with_context(|| format!("failed to query sync state of {}", path.display()))?;
            println!("State: {}", report.state().label());
            println!("{}", report.summary());
        }
        CliMode::ShowSettings => println!("{}", serde_json::to_string_pretty(&settings)?),
        CliMode::CheckIntegrations => {
            let status = detect_integration_status(cli.is_some());
            println!(
                "Integrations: state={}, details={}",
                status.summary_state(),
                status.summary_message()
            );
        }
        CliMode::InstallGuided => {
            for line in guided_install_instructions() {
                println!("{line}");
            }
        }
        CliMode::Diagnostics => {
            let status = detect_integration_status(cli.is_some());
            print_diagnostics_report(
                cli.as_ref().map(|cli| cli.program().display().to_string()),
                probe_mounts(cli.as_ref()),
                &status,
                settings,
            )?;
        }
    }
    Ok(())
}

fn print_status(cli: Option<&OdriveCli>) -> anyhow::Result<()> {
    let Some(cli) = cli else {
        println!("odrive CLI: not found");
        return Ok(());
    };
    println!("odrive CLI: {}", cli.program().display());
    let mounts = cli.mounts().context("failed to list odrive mounts")?;
    if mounts.is_empty() {
        println!("Mounts: none");
    }
    for mount in mounts {
        println!("Mount: {}", mount.display());
    }
    Ok(())
}

fn probe_mounts(cli: Option<&OdriveCli>) -> MountProbe {
    let Some(cli) = cli else {
        return MountProbe {
            mounts: Vec::new(),
            error: None,
        };
    };
    match cli.mounts() {
        Ok(mounts) => MountProbe {
            mounts: mounts
                .iter()
                .map(|mount| mount.display().to_string())
                .collect(),
            error: None,
        },
        Err(err) => MountProbe {
            mounts: Vec::new(),
            error: Some(err.to_string()),
        },
    }
}

fn init_logging(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_new(&settings.log_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_help() {
    println!(
        "Usage: odrive-ctl [--status | --sync-state <path> | --show-settings | --check-integrations | --install-guided | --diagnostics]\n(with no flags, prints the odrive CLI location and mounts)"
    );
}
