//! Database bootstrap and settings access

pub mod init;
pub mod settings;

pub use init::init_database;
pub use settings::{get_setting, set_setting};
