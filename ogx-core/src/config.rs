// Context configuration and diagnostics mask.
//
// Diagnostics are grouped by feature. The mask is parsed once, when a context
// is created, from the OPENGX_DEBUG environment variable (or an explicit
// string), and every tagged message is checked against it before it reaches
// the `log` facade.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Environment variable holding the diagnostics feature list.
pub const DEBUG_ENV_VAR: &str = "OPENGX_DEBUG";

bitflags! {
    /// Diagnostic feature categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LogFeature: u32 {
        /// Degraded behavior the caller probably did not intend.
        const WARNING = 1 << 0;
        /// Display-list recording and playback.
        const CALL_LISTS = 1 << 1;
        /// Light allocation and channel setup.
        const LIGHTING = 1 << 2;
        /// Texture lookup and texture stages.
        const TEXTURE = 1 << 3;
        /// Stencil emulation.
        const STENCIL = 1 << 4;
    }
}

const FEATURE_NAMES: &[(&str, LogFeature)] = &[
    ("warning", LogFeature::WARNING),
    ("call-lists", LogFeature::CALL_LISTS),
    ("lighting", LogFeature::LIGHTING),
    ("texture", LogFeature::TEXTURE),
    ("stencil", LogFeature::STENCIL),
];

impl LogFeature {
    /// `log` target used for messages of this feature.
    pub fn target(self) -> &'static str {
        if self.contains(LogFeature::LIGHTING) {
            "ogx::lighting"
        } else if self.contains(LogFeature::TEXTURE) {
            "ogx::texture"
        } else if self.contains(LogFeature::STENCIL) {
            "ogx::stencil"
        } else if self.contains(LogFeature::CALL_LISTS) {
            "ogx::call_lists"
        } else {
            "ogx::warning"
        }
    }
}

/// Per-context configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Enabled diagnostic features.
    #[serde(default = "LogFeature::empty")]
    pub log_mask: LogFeature,
}

impl Config {
    /// Parse a feature list such as `"lighting,warning"`.
    ///
    /// Every known feature name that appears as a substring enables its bit;
    /// the exact string `all` enables everything. Unknown words are ignored.
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            return Self {
                log_mask: LogFeature::all(),
            };
        }
        let log_mask = FEATURE_NAMES
            .iter()
            .filter(|(name, _)| value.contains(name))
            .fold(LogFeature::empty(), |mask, &(_, feature)| mask | feature);
        Self { log_mask }
    }

    /// Read the configuration from `OPENGX_DEBUG`. Missing or non-UTF-8
    /// values give an empty mask.
    pub fn from_env() -> Self {
        match std::env::var(DEBUG_ENV_VAR) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::default(),
        }
    }

    pub fn enabled(&self, feature: LogFeature) -> bool {
        self.log_mask.intersects(feature)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_mask: LogFeature::empty(),
        }
    }
}

/// Emit a debug message tagged with a diagnostic feature, if that feature is
/// enabled in the given [`Config`].
#[macro_export]
macro_rules! ogx_debug {
    ($config:expr, $feature:expr, $($arg:tt)+) => {{
        let feature: $crate::config::LogFeature = $feature;
        if $config.enabled(feature) {
            log::debug!(target: feature.target(), $($arg)+);
        }
    }};
}

/// Emit a warning gated by [`LogFeature::WARNING`].
#[macro_export]
macro_rules! ogx_warn {
    ($config:expr, $($arg:tt)+) => {{
        if $config.enabled($crate::config::LogFeature::WARNING) {
            log::warn!(target: "ogx::warning", $($arg)+);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_substrings() {
        let config = Config::parse("lighting,texture");
        assert!(config.enabled(LogFeature::LIGHTING));
        assert!(config.enabled(LogFeature::TEXTURE));
        assert!(!config.enabled(LogFeature::WARNING));
    }

    #[test]
    fn parse_all() {
        assert_eq!(Config::parse("all").log_mask, LogFeature::all());
        // "all" only counts as the whole string
        assert_eq!(Config::parse("all,lighting").log_mask, LogFeature::LIGHTING);
    }

    #[test]
    fn unknown_words_ignored() {
        assert_eq!(Config::parse("verbose").log_mask, LogFeature::empty());
    }

    #[test]
    fn targets() {
        assert_eq!(LogFeature::LIGHTING.target(), "ogx::lighting");
        assert_eq!(LogFeature::WARNING.target(), "ogx::warning");
    }
}
