//! Environment variable helpers

/// Read a non-empty environment variable
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read a boolean flag; only a case-insensitive `true` enables it.
///
/// Unset variables fall back to `default`.
pub fn env_flag(key: &str, default: bool) -> bool {
    env_string(key).map_or(default, |value| parse_flag(&value))
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
