//! File extension to editor language tag mapping.

use std::path::Path;

/// Tag used for every extension the table does not know.
pub const PLAINTEXT: &str = "plaintext";

/// Returns the editor language tag for a file path.
///
/// Unknown or missing extensions map to `plaintext`.
pub fn language_for_path(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "py" => "python",
        "js" => "javascript",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        "md" => "markdown",
        "txt" => PLAINTEXT,
        _ => PLAINTEXT,
    }
}
