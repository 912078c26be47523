use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static MOUNT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+/\w+).*").expect("mount line pattern is valid")
});

// Columns are separated by a tab or a run of two or more spaces.
static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t| {2,}").expect("column gap pattern is valid"));

/// Extracts mount points from `odrive status --mounts` output.
///
/// Only the first column (the local path) is matched, so a remote such as
/// `/Google Drive` never leaks into the result.
pub fn parse_mount_points(text: &str) -> Vec<PathBuf> {
    let mut mounts: Vec<PathBuf> = Vec::new();
    for line in text.lines() {
        let local = COLUMN_GAP.split(line).next().unwrap_or(line);
        let Some(captures) = MOUNT_LINE.captures(local) else {
            continue;
        };
        let Some(path) = captures.get(1) else {
            continue;
        };
        let path = PathBuf::from(path.as_str().trim_end());
        if !mounts.contains(&path) {
            mounts.push(path);
        }
    }
    mounts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Synced,
    Active,
    Locked,
    NotAllowed,
    Placeholder,
    Unknown,
}

impl SyncState {
    pub fn from_status_line(line: &str) -> Self {
        let line = line.trim().to_ascii_lowercase();
        if line.starts_with("synced") {
            Self::Synced
        } else if line.starts_with("active") || line.starts_with("syncing") {
            Self::Active
        } else if line.starts_with("locked") {
            Self::Locked
        } else if line.starts_with("not allowed") {
            Self::NotAllowed
        } else if line.starts_with("cloud")
            || line.starts_with("placeholder")
            || line.starts_with("not synced")
        {
            Self::Placeholder
        } else {
            Self::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Synced => "Synced",
            Self::Active => "Syncing",
            Self::Locked => "Locked",
            Self::NotAllowed => "Not allowed",
            Self::Placeholder => "Only in cloud",
            Self::Unknown => "Unknown",
        }
    }
}

/// `odrive syncstate --textonly` output: the item's own line, then one line per child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatusReport {
    pub status_line: String,
    pub children: Vec<String>,
}

impl SyncStatusReport {
    pub fn parse(text: &str) -> Self {
        let (head, rest) = text.split_once('\n').unwrap_or((text, ""));
        let children = rest
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        Self {
            status_line: head.trim().to_string(),
            children,
        }
    }

    pub fn state(&self) -> SyncState {
        SyncState::from_status_line(&self.status_line)
    }

    pub fn summary(&self) -> String {
        if self.children.is_empty() {
            return self.status_line.clone();
        }
        format!("{}\n\n{}", self.status_line, self.children.join("\n"))
    }
}
