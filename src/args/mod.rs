//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::{Command, PresetArgs, TrafficArgs};
pub use types::{HttpMethod, PositiveRate, PositiveUsize};

pub(crate) use defaults::DEFAULT_USER_AGENT;
#[cfg(any(test, feature = "fuzzing"))]
pub(crate) use parsers::parse_header;
