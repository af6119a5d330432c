/// Tokens dropped entirely when they stand alone between spaces.
const DROPPED_TOKENS: [&str; 4] = ["-", "_", "\"", "'"];

/// Map a display name to a lower-case, underscore-joined filename token.
///
/// Any run of whitespace separates two tokens.
pub fn sanitize(name: &str) -> String {
    name.split_whitespace()
        .filter(|token| !DROPPED_TOKENS.contains(token))
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// `<event>_<class>.xml` for a downloaded result.
pub fn result_filename(event_name: &str, class_name: &str) -> String {
    format!("{}_{}.xml", sanitize(event_name), sanitize(class_name))
}
