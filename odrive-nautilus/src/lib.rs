use std::path::{Path, PathBuf};

use odrive_integrations::emblems::{EMBLEMS, emblem_for_state, emblem_label};
use odrive_integrations::ids::{FILE_PLACEHOLDER_EXTENSION, FOLDER_PLACEHOLDER_EXTENSION};
use odrive_integrations::{CliCommand, OdriveCli, Settings, SyncState};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },
}

/// One entry of the selection handed over by the file manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    pub uri: String,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub paths: Vec<PathBuf>,
    pub all_directories: bool,
}

impl Selection {
    pub fn is_single(&self) -> bool {
        self.paths.len() == 1
    }
}

/// Recovers a local path from a `file://` URI, undoing percent-encoding.
pub fn local_path_from_uri(uri: &str) -> Option<PathBuf> {
    let parsed = Url::parse(uri).ok()?;
    if parsed.scheme() != "file" {
        return None;
    }
    parsed.to_file_path().ok()
}

/// Returns `None` when there is nothing to show a menu for: an empty
/// selection, or any item that is not a local file.
pub fn analyze_selection(items: &[SelectedItem]) -> Option<Selection> {
    if items.is_empty() {
        return None;
    }

    let mut paths = Vec::with_capacity(items.len());
    let mut all_directories = true;
    for item in items {
        paths.push(local_path_from_uri(&item.uri)?);
        all_directories &= item.is_directory;
    }

    Some(Selection {
        paths,
        all_directories,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    File,
    Folder,
}

pub fn placeholder_kind(path: &Path) -> Option<PlaceholderKind> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(FILE_PLACEHOLDER_EXTENSION) => Some(PlaceholderKind::File),
        Some(FOLDER_PLACEHOLDER_EXTENSION) => Some(PlaceholderKind::Folder),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub sync: Vec<PathBuf>,
    pub unsync: Vec<PathBuf>,
}

/// Placeholders can be synced, everything else can be unsynced.
pub fn classify_selection(paths: &[PathBuf]) -> SyncPlan {
    let (sync, unsync) = paths
        .iter()
        .cloned()
        .partition(|path| placeholder_kind(path).is_some());
    SyncPlan { sync, unsync }
}

pub fn mount_for_path<'a>(path: &Path, mounts: &'a [PathBuf]) -> Option<&'a Path> {
    mounts
        .iter()
        .filter(|mount| path.starts_with(mount))
        .max_by_key(|mount| mount.components().count())
        .map(PathBuf::as_path)
}

fn is_mount_point(path: &Path, mounts: &[PathBuf]) -> bool {
    mounts.iter().any(|mount| mount == path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CheckStatus,
    Sync,
    SyncRecursive,
    ExpandWithoutDownload,
    Unsync,
    Mount,
    Unmount,
    SetEmblem(&'static str),
    Restore,
}

impl MenuAction {
    pub fn id(self) -> &'static str {
        match self {
            Self::CheckStatus => "check_status",
            Self::Sync => "sync",
            Self::SyncRecursive => "sync_recursive",
            Self::ExpandWithoutDownload => "expand_no_download",
            Self::Unsync => "unsync",
            Self::Mount => "mount",
            Self::Unmount => "unmount",
            Self::SetEmblem(emblem) => emblem,
            Self::Restore => "restore",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CheckStatus => "Sync Status",
            Self::Sync => "Sync",
            Self::SyncRecursive => "Sync Folder Recursively",
            Self::ExpandWithoutDownload => "Expand Folder Without Downloading",
            Self::Unsync => "Unsync",
            Self::Mount => "Mount odrive Here",
            Self::Unmount => "Unmount",
            Self::SetEmblem(emblem) => emblem_label(emblem).unwrap_or(emblem),
            Self::Restore => "Restore Default Icon",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::CheckStatus => "odrive sync status",
            Self::Sync | Self::SyncRecursive | Self::ExpandWithoutDownload => "odrive sync",
            Self::Unsync => "odrive unsync",
            Self::Mount => "odrive mount",
            Self::Unmount => "odrive unmount",
            Self::SetEmblem(_) | Self::Restore => "Emblems",
        }
    }

    pub fn command(self, path: &Path, settings: &Settings) -> Option<CliCommand> {
        let path = path.to_path_buf();
        match self {
            Self::CheckStatus => Some(CliCommand::SyncState { path }),
            Self::Sync => Some(CliCommand::Sync {
                path,
                recursive: false,
                no_download: false,
            }),
            Self::SyncRecursive => Some(CliCommand::Sync {
                path,
                recursive: true,
                no_download: false,
            }),
            Self::ExpandWithoutDownload => Some(CliCommand::Sync {
                path,
                recursive: true,
                no_download: true,
            }),
            Self::Unsync => Some(CliCommand::Unsync { path }),
            Self::Mount => Some(CliCommand::Mount {
                local: path,
                remote: settings.mount_remote.clone(),
            }),
            Self::Unmount => Some(CliCommand::Unmount { path }),
            Self::SetEmblem(_) | Self::Restore => None,
        }
    }
}

pub const UNAVAILABLE_ID: &str = "unavailable";
pub const UNAVAILABLE_LABEL: &str = "odrive CLI not found";
pub const EMBLEMS_GROUP_LABEL: &str = "Emblems";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub action: Option<MenuAction>,
    pub sensitive: bool,
    pub targets: Vec<PathBuf>,
    /// Label of the nested submenu this entry belongs to, if any.
    pub group: Option<&'static str>,
}

impl MenuItemSpec {
    fn for_action(action: MenuAction, targets: Vec<PathBuf>) -> Self {
        Self {
            id: action.id(),
            label: action.label(),
            action: Some(action),
            sensitive: true,
            targets,
            group: None,
        }
    }

    fn in_group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    fn unavailable() -> Self {
        Self {
            id: UNAVAILABLE_ID,
            label: UNAVAILABLE_LABEL,
            action: None,
            sensitive: false,
            targets: Vec::new(),
            group: None,
        }
    }
}

pub struct MenuContext<'a> {
    pub selection: &'a Selection,
    pub mounts: &'a [PathBuf],
    /// Some selected path carries emblems or a custom icon.
    pub restorable: bool,
    pub cli_available: bool,
}

pub fn build_menu(ctx: &MenuContext<'_>) -> Vec<MenuItemSpec> {
    if !ctx.cli_available {
        return vec![MenuItemSpec::unavailable()];
    }

    let selection = ctx.selection;
    let managed: Vec<PathBuf> = selection
        .paths
        .iter()
        .filter(|path| mount_for_path(path, ctx.mounts).is_some())
        .cloned()
        .collect();
    let plan = classify_selection(&managed);
    let folder_placeholders: Vec<PathBuf> = plan
        .sync
        .iter()
        .filter(|path| placeholder_kind(path) == Some(PlaceholderKind::Folder))
        .cloned()
        .collect();
    let unsync: Vec<PathBuf> = plan
        .unsync
        .into_iter()
        .filter(|path| !is_mount_point(path, ctx.mounts))
        .collect();

    let mut items = Vec::new();
    if selection.is_single() && managed.len() == 1 {
        items.push(MenuItemSpec::for_action(
            MenuAction::CheckStatus,
            managed.clone(),
        ));
    }
    if !plan.sync.is_empty() {
        items.push(MenuItemSpec::for_action(MenuAction::Sync, plan.sync));
    }
    if !folder_placeholders.is_empty() {
        items.push(MenuItemSpec::for_action(
            MenuAction::SyncRecursive,
            folder_placeholders.clone(),
        ));
        items.push(MenuItemSpec::for_action(
            MenuAction::ExpandWithoutDownload,
            folder_placeholders,
        ));
    }
    if !unsync.is_empty() {
        items.push(MenuItemSpec::for_action(MenuAction::Unsync, unsync));
    }
    if selection.is_single() && selection.all_directories && managed.is_empty() {
        items.push(MenuItemSpec::for_action(
            MenuAction::Mount,
            selection.paths.clone(),
        ));
    }
    if selection.all_directories
        && selection
            .paths
            .iter()
            .all(|path| is_mount_point(path, ctx.mounts))
    {
        items.push(MenuItemSpec::for_action(
            MenuAction::Unmount,
            selection.paths.clone(),
        ));
    }
    if !managed.is_empty() {
        for emblem in EMBLEMS {
            items.push(
                MenuItemSpec::for_action(MenuAction::SetEmblem(emblem.name), managed.clone())
                    .in_group(EMBLEMS_GROUP_LABEL),
            );
        }
    }
    if ctx.restorable {
        items.push(MenuItemSpec::for_action(
            MenuAction::Restore,
            selection.paths.clone(),
        ));
    }
    items
}

/// Per-path emblem metadata as kept by the desktop's metadata store.
pub trait EmblemStore {
    fn emblems(&self, path: &Path) -> Result<Vec<String>, ExtensionError>;
    fn set_emblem(&self, path: &Path, emblem: &str) -> Result<(), ExtensionError>;
    fn clear_emblems(&self, path: &Path) -> Result<(), ExtensionError>;
    fn has_custom_icon(&self, path: &Path) -> Result<bool, ExtensionError>;
    fn clear_custom_icon(&self, path: &Path) -> Result<(), ExtensionError>;
    /// Bumps the modification time so the file manager redraws the icon.
    fn touch(&self, path: &Path) -> Result<(), ExtensionError>;
}

pub fn apply_state_emblem(
    store: &dyn EmblemStore,
    path: &Path,
    state: SyncState,
) -> Result<Option<&'static str>, ExtensionError> {
    let emblem = emblem_for_state(state);
    replace_emblem(store, path, emblem)?;
    Ok(emblem)
}

/// Clears existing emblems, sets `emblem` if given, then touches the path.
pub fn replace_emblem(
    store: &dyn EmblemStore,
    path: &Path,
    emblem: Option<&str>,
) -> Result<(), ExtensionError> {
    store.clear_emblems(path)?;
    if let Some(emblem) = emblem {
        store.set_emblem(path, emblem)?;
    }
    store.touch(path)
}

/// Drops emblems and any custom icon so the default icon shows again.
pub fn restore_default_icon(store: &dyn EmblemStore, path: &Path) -> Result<(), ExtensionError> {
    store.clear_emblems(path)?;
    store.clear_custom_icon(path)?;
    store.touch(path)
}

pub fn any_restorable(store: &dyn EmblemStore, paths: &[PathBuf]) -> bool {
    paths.iter().any(|path| {
        let has_emblems = store
            .emblems(path)
            .map(|emblems| !emblems.is_empty())
            .unwrap_or(false);
        has_emblems || store.has_custom_icon(path).unwrap_or(false)
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogContent {
    pub title: String,
    pub body: String,
}

pub fn perform_action(
    cli: &OdriveCli,
    store: &dyn EmblemStore,
    settings: &Settings,
    action: MenuAction,
    targets: &[PathBuf],
) -> Option<DialogContent> {
    tracing::info!(action = action.id(), targets = targets.len(), "menu action");
    match action {
        MenuAction::CheckStatus => Some(check_status(cli, store, targets)),
        MenuAction::SetEmblem(emblem) => {
            update_existing(targets, |path| replace_emblem(store, path, Some(emblem)));
            None
        }
        MenuAction::Restore => {
            update_existing(targets, |path| restore_default_icon(store, path));
            None
        }
        _ => Some(run_for_targets(cli, settings, action, targets)),
    }
}

fn check_status(cli: &OdriveCli, store: &dyn EmblemStore, targets: &[PathBuf]) -> DialogContent {
    let Some(path) = targets.first() else {
        return DialogContent {
            title: MenuAction::CheckStatus.title().to_string(),
            body: "Nothing selected".to_string(),
        };
    };

    let title = format!("Sync status of [{}]", path.display());
    let body = match cli.sync_state(path) {
        Ok(report) => {
            if let Err(err) = apply_state_emblem(store, path, report.state()) {
                tracing::warn!(path = %path.display(), "failed to update emblem: {err}");
            }
            let summary = report.summary();
            if summary.trim().is_empty() {
                "(no output)".to_string()
            } else {
                summary
            }
        }
        Err(err) => format!("Failed to run odrive: {err}"),
    };
    DialogContent { title, body }
}

fn run_for_targets(
    cli: &OdriveCli,
    settings: &Settings,
    action: MenuAction,
    targets: &[PathBuf],
) -> DialogContent {
    let mut sections = Vec::with_capacity(targets.len());
    for path in targets {
        let Some(command) = action.command(path, settings) else {
            continue;
        };
        let text = match cli.run(&command) {
            Ok(output) => output.display_text(),
            Err(err) => format!("Failed to run odrive: {err}"),
        };
        if targets.len() > 1 {
            sections.push(format!("{}:\n{}", path.display(), text));
        } else {
            sections.push(text);
        }
    }
    DialogContent {
        title: action.title().to_string(),
        body: sections.join("\n\n"),
    }
}

// Emblem changes are silent; paths that vanished since the menu was built are skipped.
fn update_existing<F>(targets: &[PathBuf], mut update: F)
where
    F: FnMut(&Path) -> Result<(), ExtensionError>,
{
    for path in targets.iter().filter(|path| path.exists()) {
        if let Err(err) = update(path) {
            tracing::warn!(path = %path.display(), "failed to update emblems: {err}");
        }
    }
}

#[cfg(feature = "nautilus-plugin")]
mod nautilus_plugin;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
