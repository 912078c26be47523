use std::path::PathBuf;

use serde::Serialize;

const NAUTILUS_LIB_NAME: &str = "libodrive_nautilus.so";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationStatus {
    pub nautilus_extension_installed: bool,
    pub odrive_cli_found: bool,
}

impl IntegrationStatus {
    pub fn summary_state(&self) -> &'static str {
        if self.nautilus_extension_installed && self.odrive_cli_found {
            "ok"
        } else {
            "needs_setup"
        }
    }

    pub fn summary_message(&self) -> String {
        let mut missing = Vec::new();
        if !self.nautilus_extension_installed {
            missing.push("nautilus_extension");
        }
        if !self.odrive_cli_found {
            missing.push("odrive_cli");
        }
        if missing.is_empty() {
            return "all integration components are present".to_string();
        }
        format!("missing components: {}", missing.join(", "))
    }
}

pub fn detect_integration_status(odrive_cli_found: bool) -> IntegrationStatus {
    let nautilus_extension_installed = nautilus_candidate_paths()
        .into_iter()
        .map(|base| base.join(NAUTILUS_LIB_NAME))
        .any(|path| path.is_file());
    IntegrationStatus {
        nautilus_extension_installed,
        odrive_cli_found,
    }
}

pub fn guided_install_instructions() -> Vec<String> {
    let target_dir = dirs::home_dir()
        .map(|home| home.join(".local/lib/nautilus/extensions-4"))
        .unwrap_or_else(|| PathBuf::from("~/.local/lib/nautilus/extensions-4"));
    vec![
        "Guided integration setup:".to_string(),
        "1) Build the extension: cargo build --release -p odrive-nautilus --features nautilus-plugin"
            .to_string(),
        format!(
            "2) Install it: mkdir -p {dir} && cp target/release/{NAUTILUS_LIB_NAME} {dir}/",
            dir = target_dir.display()
        ),
        "3) Install the odrive CLI and put it on PATH, or set ODRIVE_CLI".to_string(),
        "4) Restart Files: nautilus -q".to_string(),
        "5) Re-check status: odrive-ctl --check-integrations".to_string(),
    ]
}

fn nautilus_candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = std::env::var_os("ODRIVE_NAUTILUS_EXT_DIR") {
        paths.push(PathBuf::from(path));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".local/lib/nautilus/extensions-4"));
    }
    paths.push(PathBuf::from("/usr/lib/nautilus/extensions-4"));
    paths.push(PathBuf::from(
        "/usr/lib/x86_64-linux-gnu/nautilus/extensions-4",
    ));
    paths
}
