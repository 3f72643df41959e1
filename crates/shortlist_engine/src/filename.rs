/// File name a storage key is persisted under: the percent-encoded key plus
/// `.json`.
///
/// Encoding is reversible, so distinct keys never share a file. Path
/// separators and other unsafe characters are always escaped.
pub fn storage_filename(key: &str) -> String {
    if key.is_empty() {
        // `%` is never followed by anything but two hex digits otherwise.
        return "%.json".to_string();
    }
    let mut encoded = urlencoding::encode(key).into_owned();
    if is_reserved_device_name(&encoded) {
        escape_last_char(&mut encoded);
    }
    format!("{encoded}.json")
}

/// Windows refuses these stems regardless of extension.
fn is_reserved_device_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

// Reserved stems are plain ASCII, so the last char is one byte.
fn escape_last_char(encoded: &mut String) {
    if let Some(last) = encoded.pop() {
        encoded.push_str(&format!("%{:02X}", last as u32));
    }
}
