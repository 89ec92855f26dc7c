/// Minimal multipart/form-data parsing for browser and curl uploads.

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, excluding the needle.
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
}

/// One field of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part<'a> {
    pub name: Option<String>,
    /// Present only for file fields.
    pub filename: Option<String>,
    pub data: &'a [u8],
}

/// Splits a multipart body into its fields.
pub fn parse_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{}", boundary);
    let sep: &[u8] = b"\r\n\r\n";

    split_on(body, delimiter.as_bytes())
        .into_iter()
        .filter_map(|part| {
            let sep_pos = find_subsequence(part, sep)?;
            let headers = String::from_utf8_lossy(&part[..sep_pos]);
            let raw = &part[sep_pos + sep.len()..];
            Some(Part {
                name: header_param(&headers, "name"),
                filename: header_param(&headers, "filename"),
                data: raw.strip_suffix(b"\r\n").unwrap_or(raw),
            })
        })
        .collect()
}

/// The file field called `field_name`, if the form has one.
pub fn file_field<'a>(parts: &[Part<'a>], field_name: &str) -> Option<Part<'a>> {
    parts.iter()
        .find(|p| p.filename.is_some() && p.name.as_deref() == Some(field_name))
        .cloned()
}

/// Parses `key="value"` out of a Content-Disposition header block.
///
/// Matches whole parameter names, so asking for `name` never hits `filename`.
fn header_param(headers: &str, key: &str) -> Option<String> {
    let needle = format!("{}=\"", key);
    let mut search = 0;
    while let Some(rel) = headers[search..].find(&needle) {
        let pos = search + rel;
        let preceded_ok = headers[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| c == ' ' || c == ';');
        let rest = &headers[pos + needle.len()..];
        if preceded_ok {
            return rest.find('"').map(|end| rest[..end].to_owned());
        }
        search = pos + needle.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "XyZ";

    fn body() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"--XyZ\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n");
        b.extend_from_slice(b"--XyZ\r\nContent-Disposition: form-data; name=\"image\"; filename=\"leaf.png\"\r\n");
        b.extend_from_slice(b"Content-Type: image/png\r\n\r\n\x89PNG\r\n\x00\x01\r\n");
        b.extend_from_slice(b"--XyZ--\r\n");
        b
    }

    #[test]
    fn boundary_is_read_from_content_type() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=\"XyZ\"").as_deref(),
            Some("XyZ")
        );
        assert_eq!(extract_boundary("multipart/form-data"), None);
    }

    #[test]
    fn file_field_keeps_binary_payload_intact() {
        let body = body();
        let parts = parse_parts(&body, BOUNDARY);
        let file = file_field(&parts, "image").unwrap();
        assert_eq!(file.filename.as_deref(), Some("leaf.png"));
        assert_eq!(file.data, b"\x89PNG\r\n\x00\x01");
    }

    #[test]
    fn text_fields_are_not_files() {
        let body = body();
        let parts = parse_parts(&body, BOUNDARY);
        assert!(file_field(&parts, "note").is_none());
        assert!(parts.iter().any(|p| p.name.as_deref() == Some("note") && p.data == b"hello"));
    }

    #[test]
    fn name_lookup_does_not_match_filename() {
        let headers = "Content-Disposition: form-data; filename=\"a.png\"; name=\"image\"";
        assert_eq!(header_param(headers, "name").as_deref(), Some("image"));
        assert_eq!(header_param(headers, "filename").as_deref(), Some("a.png"));
    }
}
