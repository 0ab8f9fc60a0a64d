// HTTP client for the lighting server
//
// Wraps `reqwest::Client` with base-path URL construction and JSON body
// handling. Every endpoint the core needs is an inherent method here;
// the push channel lives in `websocket`.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{GroupRecord, HashToken, MetadataRecord, PushEndpoint, ThingRecord};
use crate::transport::TransportConfig;

/// Maximum number of body bytes quoted in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the lighting server's REST API.
///
/// All paths are resolved relative to `base_url`, which may carry a path
/// prefix (e.g. `https://home.local/lights`). Thing names are pushed as
/// percent-encoded path segments.
#[derive(Debug, Clone)]
pub struct ThingsClient {
    http: reqwest::Client,
    base_url: Url,
    /// Timeout configured on `http`, reported in `Error::Timeout`.
    timeout: Duration,
}

impl ThingsClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client` whose request
    /// timeout is `timeout`.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET get_groups`
    pub async fn list_groups(&self) -> Result<Vec<GroupRecord>, Error> {
        self.get(self.url(&["get_groups"])?).await
    }

    /// `GET get_lights`
    pub async fn list_lights(&self) -> Result<Vec<ThingRecord>, Error> {
        self.get(self.url(&["get_lights"])?).await
    }

    /// `GET get_switches`
    pub async fn list_switches(&self) -> Result<Vec<ThingRecord>, Error> {
        self.get(self.url(&["get_switches"])?).await
    }

    /// `GET z2m/get_known_things_hash`
    pub async fn metadata_hash(&self) -> Result<String, Error> {
        let token: HashToken = self
            .get(self.url(&["z2m", "get_known_things_hash"])?)
            .await?;
        Ok(token.into_string())
    }

    /// `GET z2m/meta/{name}`
    pub async fn metadata(&self, thing_name: &str) -> Result<MetadataRecord, Error> {
        self.get(self.url(&["z2m", "meta", thing_name])?).await
    }

    /// `PUT z2m/set/{name}` with a partial state body.
    pub async fn set(&self, thing_name: &str, fields: &Map<String, Value>) -> Result<(), Error> {
        self.put(self.url(&["z2m", "set", thing_name])?, fields)
            .await
    }

    /// `GET get_ws_url` -- the address of the push channel.
    pub async fn push_endpoint(&self) -> Result<String, Error> {
        let endpoint: PushEndpoint = self.get(self.url(&["get_ws_url"])?).await?;
        Ok(endpoint.url)
    }

    /// `PUT all_lights_on/prefix/{prefix}`
    pub async fn all_lights_on(&self, prefix: &str) -> Result<(), Error> {
        self.put(self.url(&["all_lights_on", "prefix", prefix])?, &Map::new())
            .await
    }

    /// `PUT all_lights_off/prefix/{prefix}`
    pub async fn all_lights_off(&self, prefix: &str) -> Result<(), Error> {
        self.put(self.url(&["all_lights_off", "prefix", prefix])?, &Map::new())
            .await
    }

    /// `PUT {}` to an arbitrary action URL (host-supplied buttons).
    ///
    /// Relative URLs are resolved against the base URL.
    pub async fn trigger(&self, action_url: &str) -> Result<(), Error> {
        let url = self.base_url.join(action_url)?;
        self.put(url, &Map::new()).await
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append `segments` to the base URL path, percent-encoding each one.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body = self.read_body(resp).await?;

        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..preview_len(&body)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn put(&self, url: Url, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        debug!("PUT {}", url);

        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        // The response payload is not needed, only the status.
        self.read_body(resp).await.map(|_| ())
    }

    /// Check the status and return the body text.
    async fn read_body(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: body[..preview_len(&body)].to_string(),
            });
        }

        resp.text().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Byte length of the error preview, clamped to a char boundary.
fn preview_len(body: &str) -> usize {
    let mut len = body.len().min(BODY_PREVIEW_LEN);
    while !body.is_char_boundary(len) {
        len -= 1;
    }
    len
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ThingsClient {
        ThingsClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn url_appends_segments_to_base_path() {
        let c = client("http://home.local:8080/lights/");
        let url = c.url(&["z2m", "meta", "Kitchen Lamp"]).unwrap();
        assert_eq!(url.as_str(), "http://home.local:8080/lights/z2m/meta/Kitchen%20Lamp");
    }

    #[test]
    fn url_without_base_path() {
        let c = client("http://home.local:8080");
        let url = c.url(&["get_groups"]).unwrap();
        assert_eq!(url.as_str(), "http://home.local:8080/get_groups");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let len = preview_len(&body);
        assert!(len <= BODY_PREVIEW_LEN);
        assert!(body.is_char_boundary(len));
    }
}
