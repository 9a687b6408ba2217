use std::ffi::OsString;
use std::path::PathBuf;

/// The prompt printed before reading every line.
pub(crate) const PROMPT: &str = "$ ";

/// Snapshot of the environment the shell depends on, taken once at startup.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShellConfig {
    /// Directories searched for external commands, in priority order.
    search_path: Vec<PathBuf>,

    /// Target of `cd ~`.
    home: Option<PathBuf>,
}

impl ShellConfig {
    pub(crate) fn new(search_path: Vec<PathBuf>, home: Option<PathBuf>) -> Self {
        Self { search_path, home }
    }

    /// Reads `PATH` and `HOME` from the process environment.
    pub(crate) fn from_env() -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|path| parse_search_path(&path))
            .unwrap_or_default();
        let home = std::env::var_os("HOME").map(PathBuf::from);

        if search_path.is_empty() {
            log::warn!("PATH is unset or empty, only builtins can be run");
        }

        Self::new(search_path, home)
    }

    pub(crate) fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub(crate) fn home(&self) -> Option<&PathBuf> {
        self.home.as_ref()
    }
}

/// Splits a `PATH`-like value with the platform list separator, skipping empty entries.
fn parse_search_path(path: &OsString) -> Vec<PathBuf> {
    std::env::split_paths(path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect()
}
