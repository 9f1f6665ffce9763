//! Cookie-session client for the API under test.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `{sign_in_path}` | Exchange email/password for session cookies |
//! | any    | `{endpoint}` | Authenticated JSON call |
//!
//! Each call is attempted exactly once.

use std::time::Duration;

use reqwest::header::{HeaderValue, COOKIE, SET_COOKIE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::ClientError;

/// Header asking the auth service to issue cookies rather than tokens.
const AUTH_MODE_HEADER: &str = "st-auth-mode";

/// Cookie carrying the client-side timestamp of the last token refresh.
const ACCESS_TOKEN_UPDATE_COOKIE: &str = "st-last-access-token-update";

/// Sign-in status reported for accepted credentials.
const SIGN_IN_OK: &str = "OK";

/// Session cookies issued by sign-in.
///
/// Custom `Debug` implementation shows cookie names only.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    /// `name=value` pairs, attributes stripped, in issue order.
    pairs: Vec<String>,
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("cookies", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl SessionCredential {
    /// Build from raw `Set-Cookie` header values. `None` when no usable cookie remains.
    pub fn from_set_cookie<'h>(headers: impl IntoIterator<Item = &'h str>) -> Option<Self> {
        let pairs: Vec<String> = headers
            .into_iter()
            .filter_map(|h| h.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('='))
            .map(str::to_string)
            .collect();
        (!pairs.is_empty()).then_some(Self { pairs })
    }

    /// Cookie names in issue order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.pairs
            .iter()
            .map(|p| p.split_once('=').map_or(p.as_str(), |(name, _)| name))
    }

    /// `Cookie` header value for a request sent at `now_millis`.
    pub fn cookie_header(&self, now_millis: i64) -> String {
        let mut header = format!("{ACCESS_TOKEN_UPDATE_COOKIE}={now_millis}");
        for pair in &self.pairs {
            header.push_str("; ");
            header.push_str(pair);
        }
        header
    }
}

/// A response captured from an authenticated call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    #[serde(rename = "formFields")]
    form_fields: [FormField<'a>; 2],
}

#[derive(Serialize)]
struct FormField<'a> {
    id: &'static str,
    value: &'a str,
}

/// Client for the API under test.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    config: SessionConfig,
}

impl SessionClient {
    /// Create a client from configuration.
    pub fn new(config: SessionConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| ClientError::Http {
            endpoint: "client_init".into(),
            source: e,
        })?;
        Ok(Self { http, config })
    }

    /// Create a client from `API_BASE_URL`, `AUTH_EMAIL`, `AUTH_PASSWORD`
    /// and `API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(SessionConfig::from_env()?)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sign in with the configured credentials.
    ///
    /// Calls `POST {base_url}{sign_in_path}` with a cookie auth-mode header.
    pub async fn sign_in(&self) -> Result<SessionCredential, ClientError> {
        let email = self
            .config
            .email
            .as_deref()
            .ok_or(ClientError::MissingCredential { name: "AUTH_EMAIL" })?;
        let password = self
            .config
            .password
            .as_ref()
            .ok_or(ClientError::MissingCredential {
                name: "AUTH_PASSWORD",
            })?;

        let endpoint = format!("POST {}", self.config.sign_in_path);
        let url = self.config.endpoint_url(&self.config.sign_in_path);
        tracing::info!(%endpoint, email, "authenticating");

        let req = SignInRequest {
            form_fields: [
                FormField {
                    id: "email",
                    value: email,
                },
                FormField {
                    id: "password",
                    value: password.as_str(),
                },
            ],
        };
        let resp = self
            .http
            .post(&url)
            .header(AUTH_MODE_HEADER, HeaderValue::from_static("cookie"))
            .json(&req)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(ClientError::Status {
                endpoint,
                status: resp.status().as_u16(),
            });
        }

        let credential = SessionCredential::from_set_cookie(
            resp.headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        // The auth service reports refused credentials in a 200 body.
        if let Ok(Value::Object(body)) = resp.json::<Value>().await {
            if let Some(status) = body.get("status").and_then(Value::as_str) {
                if status != SIGN_IN_OK {
                    return Err(ClientError::Rejected {
                        status: status.to_string(),
                    });
                }
            }
        }

        let credential = credential.ok_or(ClientError::NoSessionCookie { endpoint })?;
        tracing::info!(cookies = ?credential, "authenticated");
        Ok(credential)
    }

    /// Issue one authenticated call and capture the JSON response.
    ///
    /// Calls `{method} {base_url}{endpoint}` with `body` as JSON when given.
    pub async fn call<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&B>,
        credential: &SessionCredential,
    ) -> Result<ApiResponse, ClientError> {
        let label = format!("{method} {endpoint}");
        let url = self.config.endpoint_url(endpoint);
        tracing::info!(endpoint = %label, "fetching API response");

        let cookie = credential.cookie_header(chrono::Utc::now().timestamp_millis());
        let mut req = self.http.request(method, &url).header(COOKIE, cookie);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(|e| ClientError::Http {
            endpoint: label.clone(),
            source: e,
        })?;

        let status = resp.status().as_u16();
        if status > 299 {
            return Err(ClientError::Status {
                endpoint: label,
                status,
            });
        }

        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Deserialization {
                endpoint: label,
                source: e,
            })?;
        Ok(ApiResponse { status, body })
    }
}
