//! Command handlers, one module per command family.

mod config;
mod entries;
mod init;
mod misc;
mod safe;

pub use config::{handle_config_init, handle_config_show};
pub use entries::{handle_add, handle_autotype, handle_list, handle_remove, handle_show};
pub use init::handle_init;
pub use misc::handle_completions;
pub use safe::{handle_info, handle_passwd, handle_policies};
