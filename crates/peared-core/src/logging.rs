//! Log level handling shared by the peared binaries.

/// Map a `--log-level` value onto a tracing filter directive.
///
/// Accepts `debug`, `info`, `warn`/`warning` and `error`/`err` in any case.
/// Anything else falls back to `info`.
#[must_use]
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "err" => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_levels() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("warning"), "warn");
        assert_eq!(level_directive("err"), "error");
        assert_eq!(level_directive("info"), "info");
    }

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(level_directive("trace"), "info");
        assert_eq!(level_directive(""), "info");
    }
}
