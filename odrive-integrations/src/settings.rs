use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ids::DEFAULT_AGENT_DIR_NAME;

const DEFAULT_MOUNT_REMOTE: &str = "/";
const DEFAULT_LOG_FILTER: &str = "warn";

pub const ENV_CLI: &str = "ODRIVE_CLI";
pub const ENV_AGENT_DIR: &str = "ODRIVE_AGENT_DIR";
pub const ENV_MOUNT_REMOTE: &str = "ODRIVE_MOUNT_REMOTE";
pub const ENV_LOG: &str = "ODRIVE_NAUTILUS_LOG";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Settings {
    /// Explicit odrive executable, bypasses the `PATH` search.
    pub cli_override: Option<PathBuf>,
    /// odrive agent installation, searched for `bin/odrive.py` last.
    pub agent_dir: PathBuf,
    /// Remote location handed to `odrive mount`.
    pub mount_remote: String,
    pub log_filter: String,
}

impl Settings {
    pub fn from_env() -> Self {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self::from_lookup(&home, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(home: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let cli_override = read(ENV_CLI).map(|value| expand_with_home(&value, home));
        let agent_dir = read(ENV_AGENT_DIR)
            .map(|value| expand_with_home(&value, home))
            .unwrap_or_else(|| home.join(DEFAULT_AGENT_DIR_NAME));
        let mount_remote = read(ENV_MOUNT_REMOTE).unwrap_or_else(|| DEFAULT_MOUNT_REMOTE.to_string());
        let log_filter = read(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            cli_override,
            agent_dir,
            mount_remote,
            log_filter,
        }
    }

    pub fn agent_cli_candidates(&self) -> [PathBuf; 2] {
        let bin = self.agent_dir.join("bin");
        [bin.join("odrive.py"), bin.join("odrive")]
    }
}

fn expand_with_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(Path::new("/home/user"), |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_without_env() {
        let settings = settings_with(&[]);
        assert_eq!(settings.cli_override, None);
        assert_eq!(settings.agent_dir, PathBuf::from("/home/user/.odrive-agent"));
        assert_eq!(settings.mount_remote, "/");
        assert_eq!(settings.log_filter, "warn");
        assert_eq!(
            settings.agent_cli_candidates()[0],
            PathBuf::from("/home/user/.odrive-agent/bin/odrive.py")
        );
    }

    #[test]
    fn expands_home_prefixes() {
        let settings = settings_with(&[
            ("ODRIVE_CLI", "~/bin/odrive"),
            ("ODRIVE_AGENT_DIR", "~"),
            ("ODRIVE_MOUNT_REMOTE", "/Dropbox"),
        ]);
        assert_eq!(
            settings.cli_override,
            Some(PathBuf::from("/home/user/bin/odrive"))
        );
        assert_eq!(settings.agent_dir, PathBuf::from("/home/user"));
        assert_eq!(settings.mount_remote, "/Dropbox");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let settings = settings_with(&[("ODRIVE_CLI", "  "), ("ODRIVE_NAUTILUS_LOG", "")]);
        assert_eq!(settings.cli_override, None);
        assert_eq!(settings.log_filter, "warn");
    }
}
