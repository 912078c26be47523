use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::ids::CLI_NAMES;
use crate::settings::Settings;
use crate::status::{SyncStatusReport, parse_mount_points};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    SyncState {
        path: PathBuf,
    },
    Sync {
        path: PathBuf,
        recursive: bool,
        no_download: bool,
    },
    Unsync {
        path: PathBuf,
    },
    Mount {
        local: PathBuf,
        remote: String,
    },
    Unmount {
        path: PathBuf,
    },
    MountStatus,
}

impl CliCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SyncState { .. } => "syncstate",
            Self::Sync { .. } => "sync",
            Self::Unsync { .. } => "unsync",
            Self::Mount { .. } => "mount",
            Self::Unmount { .. } => "unmount",
            Self::MountStatus => "status",
        }
    }

    pub fn args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from(self.name())];
        match self {
            Self::SyncState { path } => {
                args.push(path.into());
                args.push("--textonly".into());
            }
            Self::Sync {
                path,
                recursive,
                no_download,
            } => {
                args.push(path.into());
                if *recursive {
                    args.push("--recursive".into());
                }
                if *no_download {
                    args.push("--nodownload".into());
                }
            }
            Self::Unsync { path } | Self::Unmount { path } => args.push(path.into()),
            Self::Mount { local, remote } => {
                args.push(local.into());
                args.push(remote.into());
            }
            Self::MountStatus => args.push("--mounts".into()),
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// What the user gets to see: stdout, or stderr when stdout is blank.
    /// Stdout with trailing whitespace trimmed, or stderr when stdout is blank.
    /// Leading and inner whitespace is kept as the CLI printed it.
    pub fn display_text(&self) -> String {
        if !self.stdout.trim().is_empty() {
            return self.stdout.trim_end().to_string();
        }
        if !self.stderr.trim().is_empty() {
            return self.stderr.trim_end().to_string();
        }
        "(no output)".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdriveCli {
    program: PathBuf,
}

impl OdriveCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn locate(settings: &Settings) -> Option<Self> {
        if let Some(path) = settings.cli_override.as_ref() {
            if path.is_file() {
                return Some(Self::new(path));
            }
            tracing::warn!(path = %path.display(), "configured odrive CLI does not exist");
        }
        for name in CLI_NAMES {
            if let Ok(path) = which::which(name) {
                return Some(Self::new(path));
            }
        }
        settings
            .agent_cli_candidates()
            .into_iter()
            .find(|path| path.is_file())
            .map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn run(&self, command: &CliCommand) -> Result<CommandOutput, CliError> {
        let args = command.args();
        tracing::debug!(program = %self.program.display(), ?args, "running odrive");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| CliError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.success() {
            tracing::warn!(
                command = command.name(),
                code = ?result.code,
                "odrive exited unsuccessfully"
            );
        }
        Ok(result)
    }

    pub fn sync_state(&self, path: &Path) -> Result<SyncStatusReport, CliError> {
        let output = self.run(&CliCommand::SyncState {
            path: path.to_path_buf(),
        })?;
        Ok(SyncStatusReport::parse(&output.stdout))
    }

    pub fn mounts(&self) -> Result<Vec<PathBuf>, CliError> {
        let output = self.run(&CliCommand::MountStatus)?;
        Ok(parse_mount_points(&output.stdout))
    }
}
