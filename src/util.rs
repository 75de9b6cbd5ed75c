use url::form_urlencoded;

use crate::error::{Error, Result};

/// Joins ids as `1,2,3`: decimal, no brackets, no spaces.
pub(crate) fn ids_to_csv(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Splits a relative request path into its path component and query pairs.
///
/// A fragment is dropped. Whitespace, control characters and malformed
/// percent escapes make the path unparsable.
pub(crate) fn split_path_query(raw: &str) -> Result<(String, Vec<(String, String)>)> {
    let invalid = |reason: &str| Error::InvalidPath {
        path: raw.to_string(),
        reason: reason.to_string(),
    };

    if let Some(c) = raw.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(&format!("unexpected character {:?}", c)));
    }
    if !valid_percent_escapes(raw) {
        return Err(invalid("malformed percent escape"));
    }

    let without_fragment = raw.split('#').next().unwrap_or(raw);
    let (path, query) = match without_fragment.split_once('?') {
        Some((p, q)) => (p, q),
        None => (without_fragment, ""),
    };

    if path.contains("://") {
        return Err(invalid("expected a relative path, not an absolute URL"));
    }

    let pairs = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok((path.to_string(), pairs))
}

fn valid_percent_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let ok = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !ok {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Joins `prefix` and `path` the way a POSIX path join does: empty and `.`
/// segments disappear, `..` pops the previous segment, no trailing slash.
pub(crate) fn join_clean(prefix: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in prefix.split('/').chain(path.split('/')) {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}
