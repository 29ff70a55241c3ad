// 📜 Logging setup shared by both binaries

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file the terminal UI writes to when asked for logs
pub const TUI_LOG_FILE: &str = "dataset-catalog.log";

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    /// Dropped; the alternate screen owns the terminal
    Off,
}

/// Level for a `-v` count, starting from `base` when no flag is given
pub fn level_for(verbose: u8, base: &str) -> &str {
    match verbose {
        0 => base,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// The terminal UI never logs to the terminal. `-v` or `RUST_LOG` sends
/// logs to a file in `dir`; otherwise they are dropped.
pub fn tui_target(verbose: u8, rust_log: Option<&str>, dir: &Path) -> LogTarget {
    let requested = verbose > 0 || rust_log.is_some_and(|s| !s.trim().is_empty());
    if requested {
        LogTarget::File(dir.join(TUI_LOG_FILE))
    } else {
        LogTarget::Off
    }
}

/// `RUST_LOG` wins over the `-v` count
pub fn init_tracing(verbose: u8, base: &str, target: &LogTarget) -> anyhow::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(level_for(verbose, base)),
    }
    .or_else(|_| EnvFilter::try_new("warn"))
    .map_err(|e| anyhow::anyhow!("invalid log level: {e}"))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    // Each writer is a different type, so each arm installs its own subscriber
    let _ = match target {
        LogTarget::Stderr => builder
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("cannot open log file {}: {e}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).try_init()
        }
        LogTarget::Off => builder.with_writer(std::io::sink).try_init(),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0, "warn"), "warn");
        assert_eq!(level_for(1, "warn"), "info");
        assert_eq!(level_for(2, "info"), "debug");
        assert_eq!(level_for(5, "info"), "trace");
    }

    #[test]
    fn test_tui_never_targets_the_terminal() {
        let dir = Path::new("/tmp/exports");

        assert_eq!(tui_target(0, None, dir), LogTarget::Off);
        assert_eq!(tui_target(0, Some("  "), dir), LogTarget::Off);
        assert_eq!(
            tui_target(1, None, dir),
            LogTarget::File(dir.join(TUI_LOG_FILE))
        );
        assert_eq!(
            tui_target(0, Some("debug"), dir),
            LogTarget::File(dir.join(TUI_LOG_FILE))
        );
    }
}
