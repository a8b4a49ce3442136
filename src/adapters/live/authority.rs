//! Live adapter for the `IdAuthority` port using the cluster `nextid` API.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::AuthorityError;
use crate::ports::IdAuthority;

const NEXTID_PATH: &str = "/api2/json/cluster/nextid";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`HttpAuthority`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpAuthorityConfig {
    /// Base URL of the cluster API, e.g. `https://pve.example.com:8006`.
    pub endpoint: String,
    /// API token in `USER@REALM!TOKENID=SECRET` form.
    pub api_token: Option<String>,
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub insecure: bool,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpAuthorityConfig {
    /// Settings for `endpoint` with no token, strict TLS and the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), api_token: None, insecure: false, timeout: DEFAULT_TIMEOUT }
    }
}

/// Live authority that asks the cluster API for free identifiers.
pub struct HttpAuthority {
    client: Client,
    url: String,
    api_token: Option<String>,
}

impl HttpAuthority {
    /// Builds the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::Transport`] if the client cannot be constructed.
    pub fn new(config: &HttpAuthorityConfig) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthorityError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}{NEXTID_PATH}", config.endpoint.trim_end_matches('/')),
            api_token: config.api_token.clone(),
        })
    }
}

/// Successful `nextid` response; the cluster encodes the id as a string.
#[derive(Deserialize)]
struct NextIdResponse {
    data: Option<IdValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(u32),
    Text(String),
}

/// Error body returned with non-success statuses.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    errors: Option<BTreeMap<String, String>>,
    #[serde(default)]
    message: Option<String>,
}

impl IdAuthority for HttpAuthority {
    fn reserve_or_suggest(&self, candidate: Option<u32>) -> Result<u32, AuthorityError> {
        let mut request = self.client.get(&self.url);
        if let Some(id) = candidate {
            request = request.query(&[("vmid", id)]);
        }
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("PVEAPIToken={token}"));
        }

        let response = request
            .send()
            .map_err(|e| AuthorityError::Transport(format!("nextid request failed: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| AuthorityError::Transport(format!("failed to read nextid response: {e}")))?;

        interpret(status, &body, candidate)
    }
}

/// Maps a `nextid` response to an identifier or a typed error.
///
/// This is the only place response text is inspected: a 400 whose body reports
/// "already exists" becomes [`AuthorityError::AlreadyExists`].
fn interpret(status: u16, body: &str, candidate: Option<u32>) -> Result<u32, AuthorityError> {
    if !(200..300).contains(&status) {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let mut details: Vec<String> = parsed
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|(field, msg)| format!("{field}: {}", msg.trim_end()))
            .collect();
        if let Some(msg) = parsed.message {
            details.push(msg.trim_end().to_string());
        }
        let message = if details.is_empty() { body.trim().to_string() } else { details.join(" - ") };

        if let Some(id) = candidate {
            if status == 400 && message.contains("already exists") {
                return Err(AuthorityError::AlreadyExists(id));
            }
        }
        return Err(AuthorityError::Api { status, message });
    }

    let parsed: NextIdResponse = serde_json::from_str(body)
        .map_err(|e| AuthorityError::InvalidResponse(format!("{e}: {body}")))?;
    match parsed.data {
        Some(IdValue::Number(id)) => Ok(id),
        Some(IdValue::Text(text)) => text
            .trim()
            .parse()
            .map_err(|e| AuthorityError::InvalidResponse(format!("non-numeric id {text:?}: {e}"))),
        None => Err(AuthorityError::InvalidResponse("response has no data".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn string_data_is_parsed() {
        assert_eq!(interpret(200, r#"{"data":"104"}"#, None), Ok(104));
    }

    #[test]
    fn numeric_data_is_parsed() {
        assert_eq!(interpret(200, r#"{"data":2500}"#, Some(2500)), Ok(2500));
    }

    #[test]
    fn missing_data_is_invalid() {
        assert!(matches!(
            interpret(200, r#"{"data":null}"#, None),
            Err(AuthorityError::InvalidResponse(_))
        ));
        assert!(matches!(interpret(200, "<html>", None), Err(AuthorityError::InvalidResponse(_))));
    }

    #[test]
    fn taken_candidate_becomes_collision() {
        let body = r#"{"data":null,"errors":{"vmid":"VM 100 already exists\n"}}"#;
        assert_eq!(interpret(400, body, Some(100)), Err(AuthorityError::AlreadyExists(100)));
    }

    #[test]
    fn other_bad_requests_stay_api_errors() {
        let body = r#"{"data":null,"errors":{"vmid":"value must have a minimum value of 100"}}"#;
        assert_eq!(
            interpret(400, body, Some(5)),
            Err(AuthorityError::Api {
                status: 400,
                message: "vmid: value must have a minimum value of 100".into()
            })
        );
    }

    #[test]
    fn server_error_keeps_raw_body() {
        assert_eq!(
            interpret(503, "service unavailable", None),
            Err(AuthorityError::Api { status: 503, message: "service unavailable".into() })
        );
    }

    /// Serves one canned HTTP response and returns the request line it saw.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut header = String::new();
            let mut authorization = String::new();
            loop {
                header.clear();
                reader.read_line(&mut header).unwrap();
                if header.to_ascii_lowercase().starts_with("authorization:") {
                    authorization = header.trim().to_string();
                }
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            format!("{} | {authorization}", request_line.trim())
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn live_request_sends_candidate_and_token() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 16\r\nConnection: close\r\n\r\n{\"data\":\"4242\"}\n",
        );
        let mut config = HttpAuthorityConfig::new(format!("{endpoint}/"));
        config.api_token = Some("root@pam!ids=secret".into());
        let authority = HttpAuthority::new(&config).unwrap();

        assert_eq!(authority.reserve_or_suggest(Some(4242)), Ok(4242));
        let seen = server.join().unwrap();
        assert!(seen.starts_with("GET /api2/json/cluster/nextid?vmid=4242 "), "{seen}");
        assert!(seen.ends_with("PVEAPIToken=root@pam!ids=secret"), "{seen}");
    }

    #[test]
    fn unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let authority = HttpAuthority::new(&HttpAuthorityConfig::new(format!("http://{addr}"))).unwrap();
        assert!(matches!(authority.reserve_or_suggest(None), Err(AuthorityError::Transport(_))));
    }
}
