use chrono::{DateTime, Utc};
use tracing::debug;
use url::{Url, form_urlencoded};

use crate::error::{Error, Result};
use crate::signature::{KEY_PARAM, SIGNATURE_PARAM, SignatureParams, TIMESTAMP_PARAM};
use crate::util::{ids_to_csv, join_clean, split_path_query};

pub(crate) const API_HOST: &str = "api.weatherlink.com";
pub(crate) const API_VERSION: &str = "v2";

/// One WeatherLink v2 endpoint with its path parameters filled in.
///
/// An empty id list asks for everything associated with the API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Stations(Vec<u64>),
    Sensors(Vec<u64>),
    Current(u64),
    Historic {
        station: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    SensorCatalog,
}

impl Endpoint {
    /// Short name used in errors and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Endpoint::Stations(_) => "Stations",
            Endpoint::Sensors(_) => "Sensors",
            Endpoint::Current(_) => "Current",
            Endpoint::Historic { .. } => "Historic",
            Endpoint::SensorCatalog => "SensorCatalog",
        }
    }

    /// The relative path, before the version prefix is applied.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Stations(ids) => format!("/stations/{}", ids_to_csv(ids)),
            Endpoint::Sensors(ids) => format!("/sensors/{}", ids_to_csv(ids)),
            Endpoint::Current(station) => format!("/current/{}", station),
            Endpoint::Historic {
                station,
                start,
                end,
            } => format!(
                "/historic/{}?start-timestamp={}&end-timestamp={}",
                station,
                start.timestamp(),
                end.timestamp()
            ),
            Endpoint::SensorCatalog => "/sensor-catalog".to_string(),
        }
    }

    /// Adds the endpoint's identifying fields to `params`.
    ///
    /// Path ids are signed but never sent as query parameters.
    pub fn sign_fields(&self, params: SignatureParams) -> SignatureParams {
        match self {
            Endpoint::Stations(ids) if !ids.is_empty() => {
                params.with("station-ids", ids_to_csv(ids))
            }
            Endpoint::Sensors(ids) if !ids.is_empty() => params.with("sensor-ids", ids_to_csv(ids)),
            Endpoint::Current(station) | Endpoint::Historic { station, .. } => {
                params.with("station-id", station)
            }
            _ => params,
        }
    }
}

/// Builds the absolute, signed URL for `path`.
///
/// Query parameters already in `path` are merged into `params` before
/// signing without replacing entries `params` already holds. The final
/// query is the path's own parameters plus `api-signature`, `api-key` and
/// `t`, sorted by name and form-urlencoded.
pub(crate) fn build_url(
    path: &str,
    mut params: SignatureParams,
    key: &str,
    secret: &str,
) -> Result<String> {
    let (path_part, path_query) = split_path_query(path)?;

    for (name, value) in &path_query {
        params.insert_if_absent(name, value);
    }

    if path_part.is_empty() {
        return Err(Error::PathRequired);
    }

    let t = params
        .get(TIMESTAMP_PARAM)
        .ok_or(Error::MissingTimestamp)?
        .to_string();
    let signature = params.signature(secret);

    let mut query = path_query;
    query.push((SIGNATURE_PARAM.to_string(), signature));
    query.push((KEY_PARAM.to_string(), key.to_string()));
    query.push((TIMESTAMP_PARAM.to_string(), t));
    query.sort_by(|a, b| a.0.cmp(&b.0));

    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();

    let mut url = Url::parse(&format!("https://{}/", API_HOST)).map_err(|e| {
        Error::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        }
    })?;
    url.set_path(&join_clean(API_VERSION, &path_part));
    url.set_query(Some(&encoded));

    debug!(path = url.path(), "built signed request url");
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params() -> SignatureParams {
        SignatureParams::new()
            .with(KEY_PARAM, "mykey")
            .with(TIMESTAMP_PARAM, 123)
    }

    fn query_of(url: &str) -> Vec<(String, String)> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn builds_known_url() {
        let url = build_url("/foo", params().with("foo", "bar"), "mykey", "mysecret").unwrap();
        assert_eq!(
            url,
            "https://api.weatherlink.com/v2/foo?api-key=mykey&api-signature=e576785c250d8c8db2e5fc2b7857b4c39ee56958107b978137e10d0fa6c1bc7b&t=123"
        );
    }

    #[test]
    fn path_query_is_signed_and_kept() {
        let url = build_url(
            "/historic/2970?start-timestamp=100&end-timestamp=200",
            params(),
            "mykey",
            "mysecret",
        )
        .unwrap();

        let expected_sig = params()
            .with("start-timestamp", "100")
            .with("end-timestamp", "200")
            .signature("mysecret");

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/v2/historic/2970");
        assert_eq!(
            query_of(&url),
            vec![
                ("api-key".to_string(), "mykey".to_string()),
                ("api-signature".to_string(), expected_sig),
                ("end-timestamp".to_string(), "200".to_string()),
                ("start-timestamp".to_string(), "100".to_string()),
                ("t".to_string(), "123".to_string()),
            ]
        );
    }

    #[test]
    fn explicit_param_wins_over_path_query() {
        let explicit = params().with("foo", "explicit");
        let url = build_url("/x?foo=path", explicit.clone(), "mykey", "mysecret").unwrap();
        let sig = query_of(&url)
            .into_iter()
            .find(|(k, _)| k == "api-signature")
            .map(|(_, v)| v)
            .unwrap();
        assert_eq!(sig, explicit.signature("mysecret"));
        // The path's own value is still what gets sent.
        assert!(url.contains("foo=path"));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            build_url("", params(), "k", "s"),
            Err(Error::PathRequired)
        ));
        assert!(matches!(
            build_url("?a=b", params(), "k", "s"),
            Err(Error::PathRequired)
        ));
    }

    #[test]
    fn unparsable_path_is_rejected() {
        assert!(matches!(
            build_url("/foo%zz", params(), "k", "s"),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn timestamp_is_required() {
        let p = SignatureParams::new().with(KEY_PARAM, "k");
        assert!(matches!(
            build_url("/foo", p, "k", "s"),
            Err(Error::MissingTimestamp)
        ));
    }

    #[test]
    fn query_values_are_form_encoded() {
        let url = build_url("/foo?q=a%20b%26c", params(), "my key", "s").unwrap();
        assert!(url.contains("api-key=my+key"), "{url}");
        assert!(url.contains("q=a+b%26c"), "{url}");
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(Endpoint::Stations(vec![]).path(), "/stations/");
        assert_eq!(Endpoint::Stations(vec![1, 2]).path(), "/stations/1,2");
        assert_eq!(Endpoint::Sensors(vec![9]).path(), "/sensors/9");
        assert_eq!(Endpoint::Current(2970).path(), "/current/2970");
        assert_eq!(Endpoint::SensorCatalog.path(), "/sensor-catalog");

        let start = Utc.timestamp_opt(1_591_894_200, 0).unwrap();
        let end = Utc.timestamp_opt(1_591_897_800, 0).unwrap();
        assert_eq!(
            Endpoint::Historic {
                station: 2970,
                start,
                end
            }
            .path(),
            "/historic/2970?start-timestamp=1591894200&end-timestamp=1591897800"
        );
    }

    #[test]
    fn endpoint_sign_fields() {
        let base = SignatureParams::new;
        assert_eq!(Endpoint::Stations(vec![]).sign_fields(base()), base());
        assert_eq!(
            Endpoint::Stations(vec![1, 2])
                .sign_fields(base())
                .get("station-ids"),
            Some("1,2")
        );
        assert_eq!(
            Endpoint::Sensors(vec![5]).sign_fields(base()).get("sensor-ids"),
            Some("5")
        );
        assert_eq!(
            Endpoint::Current(7).sign_fields(base()).get("station-id"),
            Some("7")
        );
        assert_eq!(Endpoint::SensorCatalog.sign_fields(base()), base());
    }
}
