use crate::status::SyncState;

pub const EMBLEM_IMPORTANT: &str = "emblem-important";
pub const EMBLEM_URGENT: &str = "emblem-urgent";
pub const EMBLEM_FAVORITE: &str = "emblem-favorite";
pub const EMBLEM_DEFAULT: &str = "emblem-default";
pub const EMBLEM_NEW: &str = "emblem-new";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmblemInfo {
    pub name: &'static str,
    pub label: &'static str,
}

pub const EMBLEMS: [EmblemInfo; 5] = [
    EmblemInfo {
        name: EMBLEM_IMPORTANT,
        label: "Important",
    },
    EmblemInfo {
        name: EMBLEM_URGENT,
        label: "In Progress",
    },
    EmblemInfo {
        name: EMBLEM_FAVORITE,
        label: "Favorite",
    },
    EmblemInfo {
        name: EMBLEM_DEFAULT,
        label: "Finished",
    },
    EmblemInfo {
        name: EMBLEM_NEW,
        label: "New",
    },
];

pub fn emblem_for_state(state: SyncState) -> Option<&'static str> {
    match state {
        SyncState::Synced => Some(EMBLEM_DEFAULT),
        SyncState::Active => Some(EMBLEM_URGENT),
        SyncState::Locked | SyncState::NotAllowed => Some(EMBLEM_IMPORTANT),
        SyncState::Placeholder => Some(EMBLEM_NEW),
        SyncState::Unknown => None,
    }
}

pub fn emblem_label(name: &str) -> Option<&'static str> {
    EMBLEMS
        .iter()
        .find(|emblem| emblem.name == name)
        .map(|emblem| emblem.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_states_to_catalog_emblems() {
        assert_eq!(emblem_for_state(SyncState::Synced), Some("emblem-default"));
        assert_eq!(emblem_for_state(SyncState::Active), Some("emblem-urgent"));
        assert_eq!(
            emblem_for_state(SyncState::NotAllowed),
            Some("emblem-important")
        );
        assert_eq!(emblem_for_state(SyncState::Unknown), None);
        for state in [
            SyncState::Synced,
            SyncState::Active,
            SyncState::Locked,
            SyncState::Placeholder,
        ] {
            let name = emblem_for_state(state).unwrap();
            assert!(emblem_label(name).is_some(), "{name} missing from catalog");
        }
    }

    #[test]
    fn labels_follow_catalog() {
        assert_eq!(emblem_label("emblem-urgent"), Some("In Progress"));
        assert_eq!(emblem_label("emblem-default"), Some("Finished"));
        assert_eq!(emblem_label("emblem-unknown"), None);
    }
}
