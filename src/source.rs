//! Loading the source list, either over HTTP or from a local JSON file.

use log::{debug, info};
use serde_json::Value;

use crate::error::FetchError;

/// Where the source list lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Http(String),
    File(String),
}

impl Endpoint {
    pub fn parse(endpoint: &str) -> Self {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            Self::Http(endpoint.to_string())
        } else if let Some(path) = endpoint.strip_prefix("file://") {
            Self::File(path.to_string())
        } else {
            Self::File(endpoint.to_string())
        }
    }
}

/// Fetches the list of strings stored under `field` in the JSON document at `endpoint`.
pub async fn fetch(client: &reqwest::Client, endpoint: &Endpoint, field: &str) -> Result<Vec<String>, FetchError> {
    let body = match endpoint {
        Endpoint::Http(url) => {
            debug!("GET {url}");
            let response = client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(FetchError::Http{status: response.status().as_u16(), url: url.clone()});
            }
            response.text().await?
        },
        Endpoint::File(path) => {
            debug!("reading {path}");
            tokio::fs::read_to_string(path).await.map_err(|source| FetchError::File{path: path.clone(), source})?
        },
    };

    let list = parse_payload(&body, field)?;
    info!("fetched {} entries from {endpoint:?}", list.len());
    Ok(list)
}

/// Extracts `field` from a JSON object, which must be an array of strings.
pub fn parse_payload(body: &str, field: &str) -> Result<Vec<String>, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|err| FetchError::Malformed(err.to_string()))?;

    let items = value
        .get(field)
        .ok_or_else(|| FetchError::Malformed(format!("missing field \"{field}\"")))?
        .as_array()
        .ok_or_else(|| FetchError::Malformed(format!("field \"{field}\" is not an array")))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| FetchError::Malformed(format!("non-string entry {item} in \"{field}\"")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    /// Serves a single canned HTTP response and returns the URL to request.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        format!("http://{addr}/api/1/tropes")
    }

    #[test]
    fn test_endpoint_parse() {
        assert_eq!(Endpoint::parse("https://example.org/api/1/tropes"), Endpoint::Http("https://example.org/api/1/tropes".to_string()));
        assert_eq!(Endpoint::parse("file:///tmp/tropes.json"), Endpoint::File("/tmp/tropes.json".to_string()));
        assert_eq!(Endpoint::parse("tropes.json"), Endpoint::File("tropes.json".to_string()));
    }

    #[test]
    fn test_parse_payload() {
        let list = parse_payload(r#"{"tropes": ["Chekhov's Gun", "Red Herring"], "count": 2}"#, "tropes").unwrap();
        assert_eq!(list, ["Chekhov's Gun", "Red Herring"]);
    }

    #[test]
    fn test_parse_payload_rejects_malformed() {
        for body in [
            "not json",
            r#"{"other": []}"#,
            r#"{"tropes": "Red Herring"}"#,
            r#"{"tropes": ["Red Herring", 3]}"#,
            r#"["Red Herring"]"#,
        ] {
            assert!(matches!(parse_payload(body, "tropes"), Err(FetchError::Malformed(_))), "{body}");
        }
    }

    #[tokio::test]
    async fn test_fetch_http() {
        let url = serve_once("200 OK", r#"{"tropes": ["Chekhov's Gun", "Red Herring", "MacGuffin"]}"#).await;
        let list = fetch(&client(), &Endpoint::parse(&url), "tropes").await.unwrap();
        assert_eq!(list, ["Chekhov's Gun", "Red Herring", "MacGuffin"]);
    }

    #[tokio::test]
    async fn test_fetch_http_error_status() {
        let url = serve_once("500 Internal Server Error", "{}").await;
        let err = fetch(&client(), &Endpoint::parse(&url), "tropes").await.unwrap_err();
        assert!(matches!(err, FetchError::Http{status: 500, ..}));
    }

    #[tokio::test]
    async fn test_fetch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tropes.json");
        std::fs::write(&path, r#"{"items": ["MacGuffin"]}"#).unwrap();

        let endpoint = Endpoint::File(path.to_string_lossy().into_owned());
        assert_eq!(fetch(&client(), &endpoint, "items").await.unwrap(), ["MacGuffin"]);

        let missing = Endpoint::File(dir.path().join("missing.json").to_string_lossy().into_owned());
        assert!(matches!(fetch(&client(), &missing, "items").await, Err(FetchError::File{..})));
    }
}
