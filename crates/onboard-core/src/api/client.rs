//! HTTP client for the employee backend.
//!
//! `ApiClient` attaches the stored bearer token to every authenticated call.
//! It never retries and never interprets status codes on the raw
//! [`ApiClient::request`] path; callers decide what a status means.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::ApiError;
use crate::auth::CredentialStore;
use crate::config::Config;

/// Per-request settings for [`ApiClient::request`].
///
/// `data` is only used for `PUT` requests without a raw `body`, where it is
/// serialized as the JSON body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            data: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self::method(Method::DELETE)
    }

    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn put(data: serde_json::Value) -> Self {
        Self {
            method: Method::PUT,
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialize `value` as the raw body.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, ApiError> {
        let body =
            serde_json::to_string(value).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(self.with_body(body))
    }

    fn resolved_body(&self) -> Result<Option<String>, ApiError> {
        if self.body.is_some() || self.method != Method::PUT {
            return Ok(self.body.clone());
        }
        self.data
            .as_ref()
            .map(|d| serde_json::to_string(d).map_err(|e| ApiError::InvalidRequest(e.to_string())))
            .transpose()
    }
}

/// API client for the employee backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl ApiClient {
    /// Create a client reading tokens from `store`.
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url(),
            store,
        })
    }

    /// Absolute URL for a backend path such as `/api/employees`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let credential = self.store.load()?.ok_or(ApiError::MissingCredential)?;
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", credential.token))
            .map_err(|_| ApiError::InvalidRequest("stored token is not a valid header".into()))?;
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    /// Send an authenticated request and hand back the raw response.
    ///
    /// Fails with [`ApiError::MissingCredential`] before touching the network
    /// when no credential is stored. Caller headers win over the defaults.
    pub async fn request(&self, url: &str, options: RequestOptions) -> Result<Response, ApiError> {
        let mut headers = self.auth_headers()?;
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        for name in options.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in options.headers.iter() {
            headers.append(name.clone(), value.clone());
        }

        let body = options.resolved_body()?;
        debug!(method = %options.method, url, "Sending authenticated request");

        let mut builder = self.client.request(options.method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;
        debug!(url, status = response.status().as_u16(), "Response received");
        Ok(response)
    }

    /// PUT `data` as JSON and parse the JSON reply.
    /// 401 becomes [`ApiError::AuthExpired`], any other failure status
    /// [`ApiError::Http`].
    pub async fn put_json<T, R>(&self, url: &str, data: &T) -> Result<R, ApiError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let value =
            serde_json::to_value(data).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let response = self.request(url, RequestOptions::put(value)).await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    /// Authenticated multipart POST. The form sets its own content type.
    pub async fn upload(&self, url: &str, form: multipart::Form) -> Result<Response, ApiError> {
        let headers = self.auth_headers()?;
        debug!(url, "Uploading file");
        Ok(self
            .client
            .post(url)
            .headers(headers)
            .multipart(form)
            .send()
            .await?)
    }

    /// Unauthenticated JSON POST (registration).
    pub async fn post_json_anonymous<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, ApiError> {
        debug!(url, "Sending anonymous POST");
        Ok(self.client.post(url).json(body).send().await?)
    }

    /// Unauthenticated POST with query parameters and no body (sign-in).
    pub async fn post_query_anonymous(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        debug!(url, "Sending anonymous POST");
        Ok(self.client.post(url).query(query).send().await?)
    }

    /// Check if response is successful, returning an error with body if not.
    pub async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Read the body and parse it as JSON.
    pub async fn parse_json<R: DeserializeOwned>(response: Response) -> Result<R, ApiError> {
        let url = response.url().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_serializes_data_when_no_body() {
        let options = RequestOptions::put(serde_json::json!({"a": 1}));
        assert_eq!(options.resolved_body().unwrap().as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_raw_body_wins_over_data() {
        let options = RequestOptions::put(serde_json::json!({"a": 1})).with_body("raw");
        assert_eq!(options.resolved_body().unwrap().as_deref(), Some("raw"));
    }

    #[test]
    fn test_data_ignored_for_other_methods() {
        let options = RequestOptions {
            method: Method::POST,
            data: Some(serde_json::json!({"a": 1})),
            ..RequestOptions::default()
        };
        assert_eq!(options.resolved_body().unwrap(), None);
    }

    #[test]
    fn test_url_joins_base() {
        let store = Arc::new(crate::auth::MemoryCredentialStore::new());
        let client = ApiClient::new(&Config::with_api_url("http://backend:8080/"), store).unwrap();
        assert_eq!(client.url("/api/employees"), "http://backend:8080/api/employees");
    }
}
