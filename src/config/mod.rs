//! Configuration loading, presets, and resolution into [`TrafficConfig`].
mod loader;
mod parse;
mod presets;
mod settings;
pub mod types;

#[cfg(test)]
mod tests;

use std::path::Path;

pub use loader::load_config_file;
pub use presets::{Preset, preset_config};
pub use settings::{ConfigOverrides, TrafficConfig};

pub(crate) use parse::{parse_duration_value, parse_interval_value};

use crate::args::{Command, TrafficArgs};
use crate::error::{AppResult, ConfigError};

/// Resolves the run configuration from CLI arguments: a preset subcommand or
/// the `--config` file, with CLI overrides applied on top.
///
/// # Errors
///
/// Returns an error when the config cannot be loaded or fails validation.
pub fn resolve_config(args: &TrafficArgs) -> AppResult<TrafficConfig> {
    let file = match args.command.as_ref() {
        Some(Command::Good(preset)) => preset_config(Preset::Good, &preset.target),
        Some(Command::Bad(preset)) => preset_config(Preset::Bad, &preset.target),
        None => {
            let path = args
                .config
                .as_deref()
                .ok_or(ConfigError::MissingField { field: "config" })?;
            load_config_file(Path::new(path))?
        }
    };
    TrafficConfig::resolve(file, &ConfigOverrides::from(args))
}
