//! Configuration management with environment variable support.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FAILSHOT_OUTPUT_DIR` | Root directory for failure artifacts | `./failure_screenshots` |
//! | `FAILSHOT_DIR_MODE` | Octal mode for created directories (Unix) | `777` |
//! | `FAILSHOT_FRAME_SIZE` | Framebuffer session size as `WxH`, each side at most 8192 | `800x600` |
//!
//! # Example
//!
//! ```bash
//! export FAILSHOT_OUTPUT_DIR="/var/tmp/acceptance-failures"
//! export FAILSHOT_DIR_MODE=755
//! ```

use std::env;
use std::sync::OnceLock;

use crate::framebuffer::MAX_FRAME_DIMENSION;

// ============================================================================
// Default Values
// ============================================================================

/// Default artifact root
pub const DEFAULT_OUTPUT_DIR: &str = "./failure_screenshots";

/// Default mode for created directories (before umask)
pub const DEFAULT_DIR_MODE: u32 = 0o777;

/// Default framebuffer width (pixels)
pub const DEFAULT_FRAME_WIDTH: u32 = 800;

/// Default framebuffer height (pixels)
pub const DEFAULT_FRAME_HEIGHT: u32 = 600;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the artifact root
pub const ENV_OUTPUT_DIR: &str = "FAILSHOT_OUTPUT_DIR";

/// Environment variable for the directory mode
pub const ENV_DIR_MODE: &str = "FAILSHOT_DIR_MODE";

/// Environment variable for the framebuffer size
pub const ENV_FRAME_SIZE: &str = "FAILSHOT_FRAME_SIZE";

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root directory for failure artifacts
    pub output_dir: String,
    /// Mode applied to directories created for artifacts
    pub dir_mode: u32,
    /// Framebuffer session width
    pub frame_width: u32,
    /// Framebuffer session height
    pub frame_height: u32,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let (frame_width, frame_height) = env::var(ENV_FRAME_SIZE)
            .ok()
            .and_then(|s| parse_frame_size(&s))
            .unwrap_or((DEFAULT_FRAME_WIDTH, DEFAULT_FRAME_HEIGHT));

        Self {
            output_dir: env::var(ENV_OUTPUT_DIR)
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            dir_mode: env::var(ENV_DIR_MODE)
                .ok()
                .and_then(|s| parse_dir_mode(&s))
                .unwrap_or(DEFAULT_DIR_MODE),
            frame_width,
            frame_height,
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            dir_mode: DEFAULT_DIR_MODE,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a `WxH` frame size; each side must be in `1..=MAX_FRAME_DIMENSION`
pub fn parse_frame_size(size: &str) -> Option<(u32, u32)> {
    let size = size.trim().to_lowercase();
    let (w, h) = size.split_once('x')?;
    let w: u32 = w.parse().ok()?;
    let h: u32 = h.parse().ok()?;
    let valid = 1..=MAX_FRAME_DIMENSION;
    if !valid.contains(&w) || !valid.contains(&h) {
        return None;
    }
    Some((w, h))
}

/// Parse an octal permission string such as `755` or `0o755`
pub fn parse_dir_mode(mode: &str) -> Option<u32> {
    let digits = mode.trim().trim_start_matches("0o");
    let value = u32::from_str_radix(digits, 8).ok()?;
    (value <= 0o7777).then_some(value)
}

/// Get the artifact root (convenience function)
pub fn output_dir() -> String {
    get().output_dir.clone()
}

/// Get the directory mode (convenience function)
pub fn dir_mode() -> u32 {
    get().dir_mode
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_size() {
        assert_eq!(parse_frame_size("800x600"), Some((800, 600)));
        assert_eq!(parse_frame_size("1024X768"), Some((1024, 768)));
        assert_eq!(parse_frame_size("0x600"), None);
        assert_eq!(parse_frame_size("800"), None);
        assert_eq!(parse_frame_size("wide"), None);
    }

    #[test]
    fn test_parse_frame_size_rejects_oversized() {
        assert_eq!(parse_frame_size("70000x70000"), None);
        assert_eq!(parse_frame_size("8193x600"), None);
        assert_eq!(parse_frame_size("8192x8192"), Some((8192, 8192)));
    }

    #[test]
    fn test_parse_dir_mode() {
        assert_eq!(parse_dir_mode("777"), Some(0o777));
        assert_eq!(parse_dir_mode("0o755"), Some(0o755));
        assert_eq!(parse_dir_mode("0755"), Some(0o755));
        assert_eq!(parse_dir_mode("9"), None);
        assert_eq!(parse_dir_mode("77777"), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
        assert_eq!(config.dir_mode, 0o777);
        assert_eq!((config.frame_width, config.frame_height), (800, 600));
    }
}
