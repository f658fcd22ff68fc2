// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compiler configuration.

/// Default limit on nested rule invocations and thunk entries. Sized for
/// unoptimized builds on a 2 MiB thread stack.
const DEFAULT_MAX_DEPTH: usize = 128;

/// Settings applied to every grammar an assembler builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Rule invocations and thunk bodies nested deeper than this abort
    /// the parse.
    pub max_depth: usize,
    /// Record each rule's last-invocation scope in the parser's trace.
    pub trace_scopes: bool,
    /// Keep the textual listing of lowered rules with the grammar.
    pub keep_listing: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trace_scopes: true,
            keep_listing: true,
        }
    }
}

impl CompilerConfig {
    /// Defaults overridden by `OMETA_MAX_DEPTH`, `OMETA_TRACE_SCOPES` and
    /// `OMETA_LISTING`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(depth) = lookup("OMETA_MAX_DEPTH").and_then(|v| v.trim().parse().ok()) {
            config.max_depth = depth;
        }
        if let Some(flag) = lookup("OMETA_TRACE_SCOPES").and_then(|v| parse_flag(&v)) {
            config.trace_scopes = flag;
        }
        if let Some(flag) = lookup("OMETA_LISTING").and_then(|v| parse_flag(&v)) {
            config.keep_listing = flag;
        }
        config
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_trace_scopes(mut self, on: bool) -> Self {
        self.trace_scopes = on;
        self
    }

    pub fn with_listing(mut self, on: bool) -> Self {
        self.keep_listing = on;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        let config = CompilerConfig::from_lookup(|key| match key {
            "OMETA_MAX_DEPTH" => Some("64".to_string()),
            "OMETA_TRACE_SCOPES" => Some("off".to_string()),
            _ => None,
        });
        assert_eq!(config.max_depth, 64);
        assert!(!config.trace_scopes);
        assert!(config.keep_listing);
    }

    #[test]
    fn unparsable_values_fall_back() {
        let config = CompilerConfig::from_lookup(|key| match key {
            "OMETA_MAX_DEPTH" => Some("lots".to_string()),
            "OMETA_LISTING" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config, CompilerConfig::default());
    }
}
