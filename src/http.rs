use reqwest::Method;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::client::{ApiResult, Params, Transport, Verb};
use crate::error::ClientError;

const API_PREFIX: &str = "api2/json";

/// Blocking transport authenticating with a pre-issued API token
/// (`USER@REALM!TOKENID=SECRET`).
pub struct HttpTransport {
    base_url: String,
    api_token: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: String, api_token: String) -> Result<Self, ClientError> {
        let client = Client::builder().user_agent("pve-apigen").build()?;
        Ok(Self {
            base_url,
            api_token,
            client,
        })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, verb: Verb, path: &str, params: &Params) -> Result<ApiResult, ClientError> {
        let mut url = build_url(&self.base_url, path)?;
        let method = match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        };

        let mut req = match verb {
            Verb::Get | Verb::Delete => {
                if !params.is_empty() {
                    let mut pairs = url.query_pairs_mut();
                    for (k, v) in params.iter() {
                        pairs.append_pair(k, v);
                    }
                }
                self.client.request(method, url)
            }
            Verb::Post | Verb::Put => {
                let form: Vec<(&str, &str)> = params.iter().collect();
                self.client.request(method, url).form(&form)
            }
        };
        req = req.header("authorization", format!("PVEAPIToken={}", self.api_token));

        tracing::debug!(%verb, path, "sending request");
        let resp = req.send()?;
        let status = resp.status();
        let text = resp.text()?;

        if status.as_u16() >= 400 {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(unwrap_data(body))
    }
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

fn build_url(base: &str, path: &str) -> Result<reqwest::Url, ClientError> {
    let base = base.trim_end_matches('/');
    let base = base.strip_suffix(API_PREFIX).unwrap_or(base).trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let full = format!("{base}/{API_PREFIX}/{path}");
    reqwest::Url::parse(&full).map_err(|e| ClientError::Url(format!("{full}: {e}")))
}
