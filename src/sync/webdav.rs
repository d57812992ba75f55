use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Collection, RemoteStore, SyncError};

/// Blocking WebDAV client used as a sync remote
pub struct WebDavStore {
    client: Client,
    base_url: String,
    username: String,
    password: Option<String>,
}

#[derive(Error, Debug)]
pub enum WebDavError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Authentication failed")]
    AuthFailed,
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// File/directory info from PROPFIND
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Path relative to the base URL, decoded
    pub path: String,
    pub is_collection: bool,
    pub content_length: Option<u64>,
}

impl ResourceInfo {
    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
    }
}

impl WebDavStore {
    pub fn new(base_url: &str, username: impl Into<String>, password: Option<String>) -> Result<Self, WebDavError> {
        // Normalize URL - ensure no trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(WebDavError::InvalidUrl("URL must start with http:// or https://".to_string()));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            username: username.into(),
            password,
        })
    }

    /// Build full URL for a path
    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .basic_auth(&self.username, self.password.as_ref())
    }

    /// PROPFIND - List a collection
    pub fn propfind(&self, path: &str, depth: u32) -> Result<Vec<ResourceInfo>, WebDavError> {
        let response = self
            .request(dav_method(b"PROPFIND")?, path)
            .header("Depth", depth.to_string())
            .header("Content-Type", "application/xml")
            .body(PROPFIND_BODY)
            .send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(WebDavError::AuthFailed),
            StatusCode::NOT_FOUND => return Err(WebDavError::NotFound(path.to_string())),
            status if !status.is_success() => {
                return Err(WebDavError::Server {
                    status: status.as_u16(),
                    message: response.text().unwrap_or_default(),
                });
            }
            _ => {}
        }

        let xml = response.text()?;
        parse_propfind_response(&xml, &self.base_url)
    }

    /// GET - Download file contents
    pub fn get(&self, path: &str) -> Result<Vec<u8>, WebDavError> {
        let response = self.request(Method::GET, path).send()?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(WebDavError::AuthFailed),
            StatusCode::NOT_FOUND => return Err(WebDavError::NotFound(path.to_string())),
            status if !status.is_success() => {
                return Err(WebDavError::Server {
                    status: status.as_u16(),
                    message: response.text().unwrap_or_default(),
                });
            }
            _ => {}
        }

        Ok(response.bytes()?.to_vec())
    }

    /// PUT - Upload file contents, overwriting
    pub fn put(&self, path: &str, data: &[u8]) -> Result<(), WebDavError> {
        let response = self.request(Method::PUT, path).body(data.to_vec()).send()?;

        match response.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDavError::AuthFailed),
            status => Err(WebDavError::Server {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            }),
        }
    }

    /// MKCOL - Create a collection; an existing one is fine
    pub fn mkcol(&self, path: &str) -> Result<(), WebDavError> {
        let response = self.request(dav_method(b"MKCOL")?, path).send()?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK | StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDavError::AuthFailed),
            status => Err(WebDavError::Server {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            }),
        }
    }
}

impl RemoteStore for WebDavStore {
    fn list(&self, collection: Collection) -> Result<Vec<String>, SyncError> {
        let dir = collection.dir_name();
        let entries = match self.propfind(dir, 1) {
            Ok(entries) => entries,
            Err(WebDavError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(entries
            .iter()
            .filter(|entry| !entry.is_collection && entry.path.trim_matches('/') != dir)
            .map(|entry| entry.name().to_string())
            .collect())
    }

    fn upload(&self, collection: Collection, name: &str, data: &[u8]) -> Result<(), SyncError> {
        let dir = collection.dir_name();
        self.mkcol(dir)?;
        self.put(&format!("{}/{}", dir, urlencoding::encode(name)), data)?;
        Ok(())
    }

    fn download(&self, collection: Collection, name: &str) -> Result<Vec<u8>, SyncError> {
        Ok(self.get(&format!("{}/{}", collection.dir_name(), urlencoding::encode(name)))?)
    }
}

fn dav_method(name: &[u8]) -> Result<Method, WebDavError> {
    Method::from_bytes(name).map_err(|e| WebDavError::InvalidUrl(e.to_string()))
}

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:getcontentlength/>
    <D:resourcetype/>
  </D:prop>
</D:propfind>"#;

/// Path of `href` relative to `base_url`, decoded
fn relative_path(href: &str, base_url: &str) -> String {
    // Servers return either full URLs or absolute paths in href
    let path = if let Some(stripped) = href.strip_prefix(base_url) {
        stripped
    } else if let Some(scheme_end) = base_url.find("://") {
        let after_scheme = &base_url[scheme_end + 3..];
        let base_path = after_scheme.find('/').map(|i| &after_scheme[i..]).unwrap_or("");
        href.strip_prefix(base_path.trim_end_matches('/')).unwrap_or(href)
    } else {
        href
    };
    let path = path.trim_start_matches('/');
    urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Parse a PROPFIND multistatus body.
///
/// Element prefixes vary between servers (`D:`, `d:`, none), so matching is
/// on local names only.
fn parse_propfind_response(xml: &str, base_url: &str) -> Result<Vec<ResourceInfo>, WebDavError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut resources = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<ResourceInfo> = None;
    let mut current_element = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "response" => {
                        current = Some(ResourceInfo {
                            path: String::new(),
                            is_collection: false,
                            content_length: None,
                        });
                    }
                    "collection" => {
                        if let Some(resource) = current.as_mut() {
                            resource.is_collection = true;
                        }
                    }
                    _ => {}
                }
                current_element = name;
            }
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"collection" {
                    if let Some(resource) = current.as_mut() {
                        resource.is_collection = true;
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"response" {
                    if let Some(resource) = current.take() {
                        if !resource.path.is_empty() {
                            resources.push(resource);
                        }
                    }
                }
                current_element.clear();
            }
            Ok(Event::Text(e)) => {
                if let Some(resource) = current.as_mut() {
                    let text = e.unescape().unwrap_or_default();
                    match current_element.as_str() {
                        "href" => resource.path = relative_path(text.trim(), base_url),
                        "getcontentlength" => resource.content_length = text.trim().parse().ok(),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WebDavError::InvalidResponse(format!(
                    "XML parse error at {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    log::debug!("Parsed {} resources from PROPFIND response", resources.len());
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
<d:response>
<d:href>/dav/cards/templates/</d:href>
<d:propstat><d:prop>
<d:resourcetype><d:collection/></d:resourcetype>
</d:prop></d:propstat>
</d:response>
<d:response>
<d:href>/dav/cards/templates/123.json</d:href>
<d:propstat><d:prop>
<d:getcontentlength>42</d:getcontentlength>
<d:resourcetype/>
</d:prop></d:propstat>
</d:response>
<d:response>
<d:href>/dav/cards/templates/My%20Deck_9.apkg</d:href>
<d:propstat><d:prop>
<d:resourcetype/>
</d:prop></d:propstat>
</d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_propfind_strips_base_path() {
        let resources = parse_propfind_response(LISTING, "https://example.com/dav/cards").unwrap();
        assert_eq!(resources.len(), 3);
        assert!(resources[0].is_collection);
        assert_eq!(resources[1].path, "templates/123.json");
        assert_eq!(resources[1].content_length, Some(42));
        assert_eq!(resources[2].name(), "My Deck_9.apkg");
    }

    #[test]
    fn test_parse_propfind_single_line_body() {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="utf-8"?><D:multistatus xmlns:D="DAV:">"#,
            r#"<D:response><D:href>/templates/</D:href><D:propstat><D:prop>"#,
            r#"<D:resourcetype><D:collection/></D:resourcetype></D:prop></D:propstat></D:response>"#,
            r#"<D:response><D:href>/templates/1.json</D:href><D:propstat><D:prop>"#,
            r#"<D:getcontentlength>10</D:getcontentlength><D:resourcetype/></D:prop></D:propstat></D:response>"#,
            r#"<D:response><D:href>/templates/2.json</D:href><D:propstat><D:prop>"#,
            r#"<D:resourcetype/></D:prop></D:propstat></D:response></D:multistatus>"#,
        );

        let resources = parse_propfind_response(xml, "https://example.com").unwrap();
        assert_eq!(resources.len(), 3);
        assert!(resources[0].is_collection);
        assert_eq!(resources[1].path, "templates/1.json");
        assert_eq!(resources[1].content_length, Some(10));
        assert!(!resources[2].is_collection);
        assert_eq!(resources[2].name(), "2.json");
    }

    #[test]
    fn test_parse_propfind_default_namespace() {
        let xml = r#"<multistatus xmlns="DAV:"><response><href>https://example.com/dav/decks/a%26b.apkg</href><propstat><prop><resourcetype/></prop></propstat></response></multistatus>"#;

        let resources = parse_propfind_response(xml, "https://example.com/dav").unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].path, "decks/a&b.apkg");
    }

    #[test]
    fn test_parse_propfind_rejects_malformed_xml() {
        let result = parse_propfind_response("<d:multistatus><d:response></d:href>", "https://example.com");
        assert!(matches!(result, Err(WebDavError::InvalidResponse(_))));
    }

    #[test]
    fn test_list_single_line_listing() {
        let mut server = Server::new();
        let listing = LISTING.replace("/dav/cards/", "/").replace('\n', "");
        server
            .mock("PROPFIND", "/templates")
            .with_status(207)
            .with_body(listing)
            .create();

        let store = WebDavStore::new(&server.url(), "ana", None).unwrap();
        let names = store.list(Collection::Templates).unwrap();
        assert_eq!(names, vec!["123.json".to_string(), "My Deck_9.apkg".to_string()]);
    }

    #[test]
    fn test_list_skips_collections() {
        let mut server = Server::new();
        let listing = LISTING.replace("/dav/cards/", "/");
        server
            .mock("PROPFIND", "/templates")
            .match_header("depth", "1")
            .with_status(207)
            .with_body(listing)
            .create();

        let store = WebDavStore::new(&server.url(), "ana", Some("pw".to_string())).unwrap();
        let names = store.list(Collection::Templates).unwrap();
        assert_eq!(names, vec!["123.json".to_string(), "My Deck_9.apkg".to_string()]);
    }

    #[test]
    fn test_missing_collection_lists_empty() {
        let mut server = Server::new();
        server.mock("PROPFIND", "/decks").with_status(404).create();

        let store = WebDavStore::new(&server.url(), "ana", None).unwrap();
        assert!(store.list(Collection::Decks).unwrap().is_empty());
    }

    #[test]
    fn test_upload_creates_collection_then_puts() {
        let mut server = Server::new();
        let mkcol = server.mock("MKCOL", "/deck_meta").with_status(405).create();
        let put = server
            .mock("PUT", "/deck_meta/7.json")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .match_body("{}")
            .with_status(201)
            .create();

        let store = WebDavStore::new(&server.url(), "ana", Some("pw".to_string())).unwrap();
        store.upload(Collection::DeckMeta, "7.json", b"{}").unwrap();

        mkcol.assert();
        put.assert();
    }

    #[test]
    fn test_download_auth_failure() {
        let mut server = Server::new();
        server.mock("GET", "/decks/a.apkg").with_status(401).create();

        let store = WebDavStore::new(&server.url(), "ana", None).unwrap();
        assert!(matches!(
            store.download(Collection::Decks, "a.apkg"),
            Err(SyncError::WebDav(WebDavError::AuthFailed))
        ));
    }
}
