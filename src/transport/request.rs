//! Replayable request description

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;

/// A request that can be rebuilt for every retry attempt
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    json: Option<Value>,
    basic_auth: Option<String>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        let mut request = Self::new(Method::POST, url);
        request.json = Some(body);
        request
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: vec![],
            headers: HeaderMap::new(),
            json: None,
            basic_auth: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// HTTP basic auth with an empty password
    pub fn basic_auth(mut self, username: impl Into<String>) -> Self {
        self.basic_auth = Some(username.into());
        self
    }

    /// Build a reqwest request. Request headers override `base_headers`.
    pub(crate) fn build(&self, client: &Client, base_headers: HeaderMap) -> RequestBuilder {
        let mut builder = client
            .request(self.method.clone(), &self.url)
            .headers(base_headers)
            .headers(self.headers.clone());

        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        if let Some(body) = &self.json {
            builder = builder.json(body);
        }
        if let Some(user) = &self.basic_auth {
            builder = builder.basic_auth(user, Some(""));
        }
        builder
    }
}
