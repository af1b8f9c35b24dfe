use crate::datemath::DateKey;
use crate::weather::Location;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable naming the data directory when `--data-dir` is not
/// given
pub(crate) const DATA_DIR_ENV: &str = "MONCAL_DATA_DIR";

pub(crate) const LOG_FILE: &str = "moncal.log";

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Config {
    pub(crate) data_dir: PathBuf,
    pub(crate) location: Option<Location>,
    pub(crate) verbosity: u8,
    /// Day to select on startup
    pub(crate) date: Option<DateKey>,
}

impl Config {
    pub(crate) fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}

/// Picks the data directory: an explicit path wins, then the environment,
/// then `moncal/` under the platform's local data directory.
pub(crate) fn resolve_data_dir(
    explicit: Option<PathBuf>,
    env: Option<OsString>,
    platform: Option<PathBuf>,
) -> Option<PathBuf> {
    explicit
        .or_else(|| env.filter(|s| !s.is_empty()).map(PathBuf::from))
        .or_else(|| platform.map(|p| p.join("moncal")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        assert_eq!(
            resolve_data_dir(
                Some(PathBuf::from("/tmp/cal")),
                Some(OsString::from("/env/cal")),
                Some(PathBuf::from("/home/me/.local/share")),
            ),
            Some(PathBuf::from("/tmp/cal"))
        );
    }

    #[test]
    fn test_env_before_platform() {
        assert_eq!(
            resolve_data_dir(
                None,
                Some(OsString::from("/env/cal")),
                Some(PathBuf::from("/home/me/.local/share")),
            ),
            Some(PathBuf::from("/env/cal"))
        );
    }

    #[test]
    fn test_empty_env_is_ignored() {
        assert_eq!(
            resolve_data_dir(
                None,
                Some(OsString::new()),
                Some(PathBuf::from("/home/me/.local/share")),
            ),
            Some(PathBuf::from("/home/me/.local/share/moncal"))
        );
    }

    #[test]
    fn test_nowhere() {
        assert_eq!(resolve_data_dir(None, None, None), None);
    }

    #[test]
    fn test_log_path() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/cal"),
            location: None,
            verbosity: 0,
            date: None,
        };
        assert_eq!(config.log_path(), PathBuf::from("/tmp/cal/moncal.log"));
    }
}
