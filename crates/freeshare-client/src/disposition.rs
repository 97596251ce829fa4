//! `Content-Disposition` filename extraction

/// Pull the download filename out of a `Content-Disposition` header value.
///
/// `filename*` (RFC 5987, percent-encoded) wins over plain `filename`.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };

        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended(raw.trim()),
            "filename" => plain = Some(unquote(raw.trim())),
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .map(|s| s.strip_suffix('"').unwrap_or(s))
        .unwrap_or(raw);
    inner.replace("\\\"", "\"")
}

/// `charset'language'percent-encoded`
fn decode_extended(raw: &str) -> Option<String> {
    let raw = unquote(raw);
    let mut parts = raw.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    if !charset.eq_ignore_ascii_case("utf-8") && !charset.is_empty() {
        return None;
    }

    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}
