pub const EXTENSION_TYPE_NAME: &str = "OdriveRustExtension";
pub const MENU_NAME_PREFIX: &str = "OdriveRust";

pub const CLI_NAMES: [&str; 2] = ["odrive", "odrive.py"];
pub const DEFAULT_AGENT_DIR_NAME: &str = ".odrive-agent";

pub const FILE_PLACEHOLDER_EXTENSION: &str = "cloud";
pub const FOLDER_PLACEHOLDER_EXTENSION: &str = "cloudf";

pub const EMBLEMS_ATTRIBUTE: &str = "metadata::emblems";
pub const MODIFIED_TIME_ATTRIBUTE: &str = "time::modified";
pub const CUSTOM_ICON_ATTRIBUTE: &str = "metadata::custom-icon";
pub const CUSTOM_ICON_NAME_ATTRIBUTE: &str = "metadata::custom-icon-name";
