//! Helper functions for CLI operations.

mod input;

pub use input::{prompt_init_passphrase, prompt_new_passphrase, prompt_passphrase, prompt_secret};
