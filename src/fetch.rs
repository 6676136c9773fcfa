//! Reading the bytes behind a configuration: inline `content`, a local file,
//! or a blocking http(s) GET. Nothing here retries or times out.

use std::sync::Arc;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{FacadeError, Result};
use crate::properties::{HTTP_HEADER, Properties};

/// The body of a source and, for network fetches, the media type the server
/// declared.
#[derive(Clone, Debug)]
pub struct Fetched {
    pub body: Arc<[u8]>,
    pub content_type: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| FacadeError::Config(format!("cannot build http client: {e}")))?;
        Ok(Self { client })
    }

    pub fn is_remote(location: &str) -> bool {
        location.starts_with("http://") || location.starts_with("https://")
    }

    pub fn fetch(&self, properties: &Properties) -> Result<Fetched> {
        if let Some(content) = properties.content() {
            return Ok(Fetched {
                body: Arc::from(content.as_bytes()),
                content_type: properties.media_type().map(media_type_essence),
            });
        }
        let Some(location) = properties.location() else {
            return Err(FacadeError::Config(
                "a source needs either a location or content".into(),
            ));
        };
        if Self::is_remote(location) {
            return self.get(location, properties);
        }
        let path = location.strip_prefix("file://").unwrap_or(location);
        debug!(path, "reading file");
        let body = std::fs::read(path).map_err(|e| FacadeError::io(location, e))?;
        Ok(Fetched {
            body: Arc::from(body),
            content_type: None,
        })
    }

    fn get(&self, url: &str, properties: &Properties) -> Result<Fetched> {
        let mut request = self.client.get(url);
        for (name, value) in properties.with_prefix(HTTP_HEADER) {
            request = request.header(name, value);
        }
        debug!(url, "fetching");
        let response = request.send().map_err(|e| FacadeError::io(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FacadeError::io(url, format!("server answered {status}")));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type_essence);
        let body = response.bytes().map_err(|e| FacadeError::io(url, e))?;
        Ok(Fetched {
            body: Arc::from(body.as_ref()),
            content_type,
        })
    }
}

/// `text/CSV; charset=utf-8` becomes `text/csv`.
pub fn media_type_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Lower case extension of the last path segment. Query and fragment are
/// ignored for URLs.
pub fn extension(location: &str) -> Option<String> {
    let path = if location.contains("://") {
        location.split(['?', '#']).next().unwrap_or(location)
    } else {
        location
    };
    let segment = path.rsplit(['/', '\\']).next()?;
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}
