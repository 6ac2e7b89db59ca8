/// Parse a boolean flag from a string value, or return the given default value otherwise.
///
/// Accepts `1/0`, `true/false`, `yes/no` and `on/off`, case-insensitively. Anything else yields the default.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
