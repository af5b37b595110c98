//! Command-line and environment configuration of the usage report.

use crate::{
    parser::{DEFAULT_DELIMITER, ParseOptions},
    registry::RegistryKind,
};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Number of users shown in the report unless configured otherwise.
pub const DEFAULT_TOP: usize = 15;

/// Directory prepended to file names entered at the prompt.
pub const DEFAULT_DATA_DIR: &str = "datos/";

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Lists the users that made the most use of a bike-sharing system.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
pub struct Config {
    /// Usage log to read. When omitted, the file name is asked for
    /// interactively and looked up in the data directory.
    pub file: Option<PathBuf>,

    /// Field delimiter of the usage log.
    #[arg(long, default_value = ";", value_parser = parse_delimiter, env = "BIZI_DELIMITER")]
    pub delimiter: u8,

    /// Number of users to show.
    #[arg(long, default_value_t = DEFAULT_TOP, env = "BIZI_TOP")]
    pub top: usize,

    /// Directory holding the usage logs, used for file names entered at the
    /// prompt.
    #[arg(long, default_value = DEFAULT_DATA_DIR, env = "BIZI_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Registry used to aggregate per-user counters.
    #[arg(long, default_value = "sorted", env = "BIZI_REGISTRY", value_enum)]
    pub registry: RegistryKind,

    /// Also store the report in a csv file.
    #[arg(long = "csv", env = "BIZI_RESULTS_CSV")]
    pub output_csv: Option<PathBuf>,
}

impl Config {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::with_delimiter(self.delimiter)
    }

    /// Path of a usage log named at the prompt.
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(Path::new(name.trim()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file: None,
            delimiter: DEFAULT_DELIMITER,
            top: DEFAULT_TOP,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            registry: RegistryKind::Sorted,
            output_csv: None,
        }
    }
}

/// Records are split on a single byte, so only one ASCII character is
/// accepted.
fn parse_delimiter(value: &str) -> Result<u8, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(format!(
            "delimiter must be a single ASCII character, got '{value}'"
        )),
    }
}
