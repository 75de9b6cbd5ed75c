use std::path::{Path, PathBuf};

use crate::client::ClientConfig;
use crate::error::{Error, Result};

const KEY_ENV: &str = "WEATHERLINK_API_KEY";
const SECRET_ENV: &str = "WEATHERLINK_API_SECRET";
const RC_ENV: &str = "WEATHERLINK_RC";
const RC_NAME: &str = ".weatherlinkrc";

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    key: Option<String>,
    secret: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    key: Option<String>,
    secret: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let mut key = key.or_else(|| std::env::var(KEY_ENV).ok());
    let mut secret = secret.or_else(|| std::env::var(SECRET_ENV).ok());

    let rc_candidates = rc_candidates();
    let mut file_verify: Option<bool> = None;

    if key.is_none() || secret.is_none() || verify.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path)?;
                if key.is_none() {
                    key = cfg.key;
                }
                if secret.is_none() {
                    secret = cfg.secret;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let key = key.ok_or_else(|| missing("key", KEY_ENV, &rc_candidates))?;
    let secret = secret.ok_or_else(|| missing("secret", SECRET_ENV, &rc_candidates))?;
    let verify = verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig {
        key,
        secret,
        verify,
    })
}

fn missing(name: &str, env: &str, rc_candidates: &[PathBuf]) -> Error {
    if rc_candidates.is_empty() {
        return Error::Config(format!(
            "missing API {} (set {} or create {})",
            name, env, RC_NAME
        ));
    }
    Error::Config(format!(
        "missing API {} (set {} or put `{}:` in one of: {})",
        name,
        env,
        name,
        rc_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // A bare `key:` may have its value on the following line.
    let mut pending: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = pending.take() {
            if !line.contains(':') {
                cfg.set(name, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "key" | "secret" if v.is_empty() => {
                    pending = Some(if k == "key" { "key" } else { "secret" });
                }
                "key" | "secret" | "verify" => cfg.set(k, v),
                _ => {}
            }
        }
    }

    cfg
}

impl RcConfig {
    fn set(&mut self, name: &str, value: &str) {
        match name {
            "key" => self.key = Some(value.to_string()),
            "secret" => self.secret = Some(value.to_string()),
            "verify" if !value.is_empty() => self.verify = Some(value != "0"),
            _ => {}
        }
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    ['"', '\'']
        .iter()
        .find_map(|&q| s.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)))
        .unwrap_or(s)
}

/// Where an rc file may live. `WEATHERLINK_RC` pins a single path;
/// otherwise the working directory is tried before the home directory.
fn rc_candidates() -> Vec<PathBuf> {
    match std::env::var_os(RC_ENV) {
        Some(explicit) => vec![PathBuf::from(explicit)],
        None => std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::home_dir())
            .map(|dir| dir.join(RC_NAME))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_rc_lines() {
        let cfg = parse_rc(
            "# davis account\nkey: abc123\nsecret: \"s3cr3t\"\nverify: 0\nunknown: x\n",
        );
        assert_eq!(
            cfg,
            RcConfig {
                key: Some("abc123".into()),
                secret: Some("s3cr3t".into()),
                verify: Some(false),
            }
        );
    }

    #[test]
    fn value_on_next_line() {
        let cfg = parse_rc("key:\n  'abc'\nsecret:\nxyz\n");
        assert_eq!(cfg.key.as_deref(), Some("abc"));
        assert_eq!(cfg.secret.as_deref(), Some("xyz"));
        assert_eq!(cfg.verify, None);
    }

    #[test]
    fn bare_key_followed_by_another_entry() {
        let cfg = parse_rc("key:\nsecret: xyz\n");
        assert_eq!(cfg.key, None);
        assert_eq!(cfg.secret.as_deref(), Some("xyz"));
    }

    #[test]
    fn quotes_are_stripped_only_when_matched() {
        assert_eq!(strip_quotes(" \"abc\" "), "abc");
        assert_eq!(strip_quotes("'abc'"), "abc");
        assert_eq!(strip_quotes("\"abc'"), "\"abc'");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("\"\""), "");
        assert_eq!(strip_quotes("plain"), "plain");
    }

    #[test]
    fn reads_rc_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "key: k1\nsecret: s1").unwrap();
        let cfg = read_rc(file.path()).unwrap();
        assert_eq!(cfg.key.as_deref(), Some("k1"));
        assert_eq!(cfg.secret.as_deref(), Some("s1"));
    }

    #[test]
    fn unreadable_rc_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_rc(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }

    #[test]
    fn explicit_values_skip_lookup() {
        let cfg = load_config(Some("k".into()), Some("s".into()), Some(false)).unwrap();
        assert_eq!(cfg.key, "k");
        assert_eq!(cfg.secret, "s");
        assert!(!cfg.verify);
    }
}
