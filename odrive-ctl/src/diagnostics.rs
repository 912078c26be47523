use anyhow::Result;
use odrive_integrations::Settings;
use serde::Serialize;

use crate::integration_control::IntegrationStatus;

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub cli_path: Option<String>,
    pub mounts: Vec<String>,
    pub mounts_error: Option<String>,
    pub integrations: IntegrationSnapshot,
    pub settings: Settings,
}

#[derive(Debug, Serialize)]
pub struct IntegrationSnapshot {
    pub state: String,
    pub details: String,
    pub nautilus_extension_installed: bool,
    pub odrive_cli_found: bool,
}

pub struct MountProbe {
    pub mounts: Vec<String>,
    pub error: Option<String>,
}

pub fn print_diagnostics_report(
    cli_path: Option<String>,
    probe: MountProbe,
    integrations: &IntegrationStatus,
    settings: Settings,
) -> Result<()> {
    let report = DiagnosticsReport {
        cli_path,
        mounts: probe.mounts,
        mounts_error: probe.error,
        integrations: IntegrationSnapshot {
            state: integrations.summary_state().to_string(),
            details: integrations.summary_message(),
            nautilus_extension_installed: integrations.nautilus_extension_installed,
            odrive_cli_found: integrations.odrive_cli_found,
        },
        settings,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
