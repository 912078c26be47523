use super::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;

#[derive(Default)]
struct MemoryEmblemStore {
    emblems: RefCell<HashMap<PathBuf, Vec<String>>>,
    custom_icons: RefCell<Vec<PathBuf>>,
    touched: RefCell<Vec<PathBuf>>,
}

impl EmblemStore for MemoryEmblemStore {
    fn emblems(&self, path: &Path) -> Result<Vec<String>, ExtensionError> {
        Ok(self
            .emblems
            .borrow()
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    fn set_emblem(&self, path: &Path, emblem: &str) -> Result<(), ExtensionError> {
        self.emblems
            .borrow_mut()
            .insert(path.to_path_buf(), vec![emblem.to_string()]);
        Ok(())
    }

    fn clear_emblems(&self, path: &Path) -> Result<(), ExtensionError> {
        self.emblems.borrow_mut().remove(path);
        Ok(())
    }

    fn has_custom_icon(&self, path: &Path) -> Result<bool, ExtensionError> {
        Ok(self.custom_icons.borrow().iter().any(|icon| icon == path))
    }

    fn clear_custom_icon(&self, path: &Path) -> Result<(), ExtensionError> {
        self.custom_icons.borrow_mut().retain(|icon| icon != path);
        Ok(())
    }

    fn touch(&self, path: &Path) -> Result<(), ExtensionError> {
        self.touched.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

const FAKE_ODRIVE: &str = r#"#!/bin/sh
case "$1" in
  syncstate)
    printf 'Active\nbig.iso: Active\n'
    ;;
  *)
    echo "$@"
    ;;
esac
"#;

fn fake_cli(dir: &Path) -> OdriveCli {
    let path = dir.join("odrive");
    fs::write(&path, FAKE_ODRIVE).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    OdriveCli::new(path)
}

fn test_settings() -> Settings {
    Settings::from_lookup(Path::new("/home/user"), |_| None)
}

fn item(uri: &str, is_directory: bool) -> SelectedItem {
    SelectedItem {
        uri: uri.to_string(),
        is_directory,
    }
}

fn selection(paths: &[&str], all_directories: bool) -> Selection {
    Selection {
        paths: paths.iter().map(PathBuf::from).collect(),
        all_directories,
    }
}

fn mounts() -> Vec<PathBuf> {
    vec![PathBuf::from("/home/user/odrive")]
}

// Top-level entries only; the emblem picker lives in its own submenu.
fn action_ids(items: &[MenuItemSpec]) -> Vec<&'static str> {
    items
        .iter()
        .filter(|item| item.group.is_none())
        .map(|item| item.id)
        .collect()
}

fn emblem_entries(items: &[MenuItemSpec]) -> Vec<&MenuItemSpec> {
    items
        .iter()
        .filter(|item| item.group == Some(EMBLEMS_GROUP_LABEL))
        .collect()
}

#[test]
fn decodes_file_uris() {
    assert_eq!(
        local_path_from_uri("file:///home/user/My%20Docs/r%C3%A9sum%C3%A9.txt"),
        Some(PathBuf::from("/home/user/My Docs/résumé.txt"))
    );
    assert_eq!(
        local_path_from_uri("file://localhost/tmp/a%23b"),
        Some(PathBuf::from("/tmp/a#b"))
    );
    assert_eq!(local_path_from_uri("sftp://host/home/user/a.txt"), None);
    assert_eq!(local_path_from_uri("file://fileserver/share/a.txt"), None);
    assert_eq!(local_path_from_uri("/home/user/a.txt"), None);
}

#[test]
fn selection_tracks_homogeneity() {
    let dirs = analyze_selection(&[
        item("file:///home/user/odrive/A", true),
        item("file:///home/user/odrive/B", true),
    ])
    .unwrap();
    assert!(dirs.all_directories);

    let files = analyze_selection(&[item("file:///home/user/odrive/a.txt", false)]).unwrap();
    assert!(!files.all_directories);

    let mixed = analyze_selection(&[
        item("file:///home/user/odrive/A", true),
        item("file:///home/user/odrive/a.txt", false),
    ])
    .unwrap();
    assert!(!mixed.all_directories);
}

#[test]
fn selection_rejects_empty_and_non_local_items() {
    assert_eq!(analyze_selection(&[]), None);
    assert_eq!(
        analyze_selection(&[
            item("file:///home/user/odrive/a.txt", false),
            item("trash:///a.txt", false),
        ]),
        None
    );
}

#[test]
fn classification_is_disjoint_and_exhaustive() {
    let paths: Vec<PathBuf> = [
        "/m/report.pdf.cloud",
        "/m/Photos.cloudf",
        "/m/notes.txt",
        "/m/Projects",
        "/m/.cloud",
        "/m/archive.cloudfx",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();

    let plan = classify_selection(&paths);
    assert_eq!(
        plan.sync,
        vec![
            PathBuf::from("/m/report.pdf.cloud"),
            PathBuf::from("/m/Photos.cloudf")
        ]
    );
    assert_eq!(plan.sync.len() + plan.unsync.len(), paths.len());
    for path in &paths {
        assert!(plan.sync.contains(path) ^ plan.unsync.contains(path));
    }
    assert_eq!(
        placeholder_kind(Path::new("/m/Photos.cloudf")),
        Some(PlaceholderKind::Folder)
    );
    assert_eq!(placeholder_kind(Path::new("/m/.cloud")), None);
}

#[test]
fn finds_deepest_mount_for_path() {
    let mounts = vec![
        PathBuf::from("/home/user/odrive"),
        PathBuf::from("/home/user/odrive/Work"),
    ];
    assert_eq!(
        mount_for_path(Path::new("/home/user/odrive/Work/a.txt"), &mounts),
        Some(Path::new("/home/user/odrive/Work"))
    );
    assert_eq!(
        mount_for_path(Path::new("/home/user/odrive2/a.txt"), &mounts),
        None
    );
}

#[test]
fn missing_cli_yields_single_disabled_item() {
    let selection = selection(&["/home/user/odrive/a.txt"], false);
    let menu = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts(),
        restorable: true,
        cli_available: false,
    });
    assert_eq!(menu.len(), 1);
    assert_eq!(menu[0].label, "odrive CLI not found");
    assert!(!menu[0].sensitive);
    assert_eq!(menu[0].action, None);
}

#[test]
fn single_synced_file_offers_status_and_unsync() {
    let selection = selection(&["/home/user/odrive/a.txt"], false);
    let menu = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts(),
        restorable: false,
        cli_available: true,
    });
    assert_eq!(action_ids(&menu), vec!["check_status", "unsync"]);
    assert!(menu.iter().all(|item| item.sensitive));
}

#[test]
fn mixed_placeholder_selection_splits_sync_and_unsync() {
    let selection = selection(
        &[
            "/home/user/odrive/a.txt",
            "/home/user/odrive/b.cloud",
            "/home/user/odrive/Photos.cloudf",
            "/tmp/outside.cloud",
        ],
        false,
    );
    let menu = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts(),
        restorable: false,
        cli_available: true,
    });
    assert_eq!(
        action_ids(&menu),
        vec!["sync", "sync_recursive", "expand_no_download", "unsync"]
    );
    assert_eq!(
        menu[0].targets,
        vec![
            PathBuf::from("/home/user/odrive/b.cloud"),
            PathBuf::from("/home/user/odrive/Photos.cloudf"),
        ]
    );
    assert_eq!(
        menu[1].targets,
        vec![PathBuf::from("/home/user/odrive/Photos.cloudf")]
    );
    assert_eq!(menu[3].targets, vec![PathBuf::from("/home/user/odrive/a.txt")]);
}

#[test]
fn unmanaged_directory_offers_mount_only() {
    let selection = selection(&["/home/user/Cloud"], true);
    let menu = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts(),
        restorable: false,
        cli_available: true,
    });
    assert_eq!(action_ids(&menu), vec!["mount"]);

    let files = self::selection(&["/home/user/notes.txt"], false);
    let menu = build_menu(&MenuContext {
        selection: &files,
        mounts: &mounts(),
        restorable: false,
        cli_available: true,
    });
    assert!(menu.is_empty());
}

#[test]
fn mount_point_offers_unmount_but_not_unsync() {
    let selection = selection(&["/home/user/odrive"], true);
    let menu = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts(),
        restorable: false,
        cli_available: true,
    });
    assert_eq!(action_ids(&menu), vec!["check_status", "unmount"]);
}

#[test]
fn mixed_kinds_hide_directory_actions() {
    let selection = Selection {
        paths: vec![PathBuf::from("/home/user/odrive"), PathBuf::from("/home/user/x.txt")],
        all_directories: false,
    };
    let menu = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts(),
        restorable: true,
        cli_available: true,
    });
    assert_eq!(action_ids(&menu), vec!["restore"]);
    assert_eq!(menu.last().unwrap().targets, selection.paths);
}

#[test]
fn managed_selection_offers_emblem_picker() {
    let selection = selection(
        &["/home/user/odrive/a.txt", "/home/user/elsewhere.txt"],
        false,
    );
    let menu = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts(),
        restorable: false,
        cli_available: true,
    });
    let picker = emblem_entries(&menu);
    assert_eq!(
        picker.iter().map(|item| item.label).collect::<Vec<_>>(),
        vec!["Important", "In Progress", "Favorite", "Finished", "New"]
    );
    assert_eq!(
        picker[3].action,
        Some(MenuAction::SetEmblem("emblem-default"))
    );
    for item in picker {
        assert_eq!(item.targets, vec![PathBuf::from("/home/user/odrive/a.txt")]);
    }
}

#[test]
fn unmanaged_selection_has_no_emblem_picker() {
    let selection = selection(&["/home/user/notes.txt"], false);
    let menu = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts(),
        restorable: true,
        cli_available: true,
    });
    assert!(emblem_entries(&menu).is_empty());
    assert_eq!(action_ids(&menu), vec!["restore"]);
}

#[test]
fn state_emblem_replaces_previous_and_touches() {
    let store = MemoryEmblemStore::default();
    let path = Path::new("/home/user/odrive/a.txt");
    store.set_emblem(path, "emblem-favorite").unwrap();

    let applied = apply_state_emblem(&store, path, SyncState::Synced).unwrap();
    assert_eq!(applied, Some("emblem-default"));
    assert_eq!(store.emblems(path).unwrap(), vec!["emblem-default"]);
    assert_eq!(store.touched.borrow().as_slice(), &[path.to_path_buf()]);

    let applied = apply_state_emblem(&store, path, SyncState::Unknown).unwrap();
    assert_eq!(applied, None);
    assert!(store.emblems(path).unwrap().is_empty());
    assert!(!any_restorable(&store, &[path.to_path_buf()]));
}

#[test]
fn custom_icon_counts_as_restorable() {
    let store = MemoryEmblemStore::default();
    let plain = PathBuf::from("/home/user/odrive/plain.txt");
    let iconic = PathBuf::from("/home/user/odrive/iconic.txt");
    assert!(!any_restorable(&store, std::slice::from_ref(&plain)));

    store.custom_icons.borrow_mut().push(iconic.clone());
    assert!(any_restorable(&store, &[plain, iconic]));
}

#[test]
fn check_status_reports_lines_and_sets_emblem() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path());
    let store = MemoryEmblemStore::default();
    let target = PathBuf::from("/home/user/odrive/Videos");

    let dialog = perform_action(
        &cli,
        &store,
        &test_settings(),
        MenuAction::CheckStatus,
        std::slice::from_ref(&target),
    )
    .unwrap();
    assert_eq!(dialog.title, "Sync status of [/home/user/odrive/Videos]");
    assert_eq!(dialog.body, "Active\n\nbig.iso: Active");
    assert_eq!(store.emblems(&target).unwrap(), vec!["emblem-urgent"]);
}

#[test]
fn sync_runs_once_per_target() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path());
    let store = MemoryEmblemStore::default();
    let targets = vec![
        PathBuf::from("/home/user/odrive/a.cloud"),
        PathBuf::from("/home/user/odrive/B.cloudf"),
    ];

    let dialog = perform_action(
        &cli,
        &store,
        &test_settings(),
        MenuAction::ExpandWithoutDownload,
        &targets,
    )
    .unwrap();
    assert_eq!(dialog.title, "odrive sync");
    assert_eq!(
        dialog.body,
        "/home/user/odrive/a.cloud:\nsync /home/user/odrive/a.cloud --recursive --nodownload\n\n\
         /home/user/odrive/B.cloudf:\nsync /home/user/odrive/B.cloudf --recursive --nodownload"
    );
}

#[test]
fn mount_uses_configured_remote() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path());
    let store = MemoryEmblemStore::default();
    let settings = Settings::from_lookup(Path::new("/home/user"), |name| {
        (name == "ODRIVE_MOUNT_REMOTE").then(|| "/Google Drive".to_string())
    });

    let dialog = perform_action(
        &cli,
        &store,
        &settings,
        MenuAction::Mount,
        &[PathBuf::from("/home/user/Cloud")],
    )
    .unwrap();
    assert_eq!(dialog.body, "mount /home/user/Cloud /Google Drive");
}

#[test]
fn spawn_failure_is_shown_in_dialog() {
    let cli = OdriveCli::new("/nonexistent/odrive-for-tests");
    let store = MemoryEmblemStore::default();
    let dialog = perform_action(
        &cli,
        &store,
        &test_settings(),
        MenuAction::Unsync,
        &[PathBuf::from("/home/user/odrive/a.txt")],
    )
    .unwrap();
    assert!(dialog.body.starts_with("Failed to run odrive:"));
}

#[test]
fn set_emblem_replaces_existing_and_skips_missing_paths() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("kept.txt");
    fs::write(&existing, b"x").unwrap();
    let missing = dir.path().join("gone.txt");
    let store = MemoryEmblemStore::default();
    store.set_emblem(&existing, "emblem-urgent").unwrap();

    let dialog = perform_action(
        &OdriveCli::new("/nonexistent/odrive-for-tests"),
        &store,
        &test_settings(),
        MenuAction::SetEmblem("emblem-favorite"),
        &[existing.clone(), missing.clone()],
    );
    assert_eq!(dialog, None);
    assert_eq!(store.emblems(&existing).unwrap(), vec!["emblem-favorite"]);
    assert!(store.emblems(&missing).unwrap().is_empty());
    assert_eq!(store.touched.borrow().as_slice(), &[existing]);
}

#[test]
fn restore_clears_emblems_and_custom_icon() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("kept.txt");
    fs::write(&existing, b"x").unwrap();
    let missing = dir.path().join("gone.txt");
    let store = MemoryEmblemStore::default();
    store.set_emblem(&existing, "emblem-default").unwrap();
    store.set_emblem(&missing, "emblem-default").unwrap();
    store.custom_icons.borrow_mut().push(existing.clone());

    let dialog = perform_action(
        &OdriveCli::new("/nonexistent/odrive-for-tests"),
        &store,
        &test_settings(),
        MenuAction::Restore,
        &[existing.clone(), missing.clone()],
    );
    assert_eq!(dialog, None);
    assert!(store.emblems(&existing).unwrap().is_empty());
    assert!(!store.has_custom_icon(&existing).unwrap());
    assert_eq!(store.emblems(&missing).unwrap(), vec!["emblem-default"]);
    assert_eq!(store.touched.borrow().as_slice(), &[existing]);
}
