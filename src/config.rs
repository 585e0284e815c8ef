//! Configuration
//!
//! Plain options struct. `main.rs` is the only place that knows about
//! `clap`; everything else takes a `Config`.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub input_path: PathBuf,
    pub preprocess_only: bool,
    pub verbose: bool,
    pub extra_verbose: bool,
    pub quiet: bool,
    /// Overrides the `build` directive's target when set.
    pub target_override: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("default.xmk"),
            preprocess_only: false,
            verbose: false,
            extra_verbose: false,
            quiet: false,
            target_override: None,
        }
    }
}

impl Config {
    pub fn is_verbose(&self) -> bool {
        self.verbose || self.extra_verbose
    }
}
