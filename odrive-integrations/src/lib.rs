pub mod cli;
pub mod emblems;
pub mod ids;
pub mod settings;
pub mod status;

pub use cli::{CliCommand, CliError, CommandOutput, OdriveCli};
pub use emblems::{EmblemInfo, emblem_for_state};
pub use settings::Settings;
pub use status::{SyncState, SyncStatusReport, parse_mount_points};
