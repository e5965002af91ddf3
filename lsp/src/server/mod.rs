mod config;
mod entry;
mod handlers;
mod signature;
mod state;
mod text;

pub use entry::run;

/// Configuration section requested from the client.
pub(crate) const CONFIG_SECTION: &str = "dosescript";
