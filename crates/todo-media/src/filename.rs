/// Image extensions accepted for direct uploads (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Returns the extension of `filename` if it is on the allow-list.
/// The extension is returned as written, so `Photo.JPG` yields `JPG`.
pub fn allowed_extension(filename: &str) -> Option<&str> {
    let (_, ext) = filename.rsplit_once('.')?;
    ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        .then_some(ext)
}

/// Reduce a client-supplied filename to something safe to place in a
/// single directory: ASCII only, path separators and whitespace collapsed to
/// `_`, only `[A-Za-z0-9_.-]` kept, and no leading or trailing `.`/`_`.
///
/// May return an empty string.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
