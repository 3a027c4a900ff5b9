// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Crittercism REST client
//!
//! Every endpoint method is a thin specialization of [`CrittercismClient::request`],
//! which attaches the fixed headers and bearer token, sends the call and maps
//! the status code onto [`CrittercismError`]. Calls are issued one at a time;
//! nothing here spawns concurrent requests.

use std::{fmt, str::FromStr, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONNECTION, HeaderMap, HeaderValue},
};
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{
    config::ClientConfig,
    error::{CrittercismError, CrittercismResult, RawResponse},
    lookback::{format_timestamp, lookback_start},
    models::{
        APP_ATTRIBUTES, App, CrashDetails, CrashTable, ErrorMonitoringGraph, ErrorMonitoringPie,
        ErrorMonitoringRequest, ExceptionDetails, PerformanceManagementPie,
        PerformanceManagementRequest,
    },
    tokens::{TokenCache, transaction_scope},
};

/// API version prefix shared by every endpoint
pub const API_VERSION: &str = "v1.0";

/// Lifetime requested for every issued token, in seconds (one year)
pub const TOKEN_DURATION_SECONDS: u64 = 31_536_000;

const SOURCE_HEADER: &str = "cr-source";
const SOURCE_HEADER_VALUE: &str = "integration_new_relic";
const USER_AGENT: &str = concat!("crittercism-client/", env!("CARGO_PKG_VERSION"));

/// Request verbs the client knows how to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Plain GET, body ignored
    Get,
    /// POST with a JSON body
    Post,
    /// Form-encoded POST used for the token exchange
    Token,
}

impl Verb {
    /// Wire name of the verb
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Token => "TOKEN",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = CrittercismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "TOKEN" => Ok(Self::Token),
            other => Err(CrittercismError::UnsupportedVerb {
                verb: other.to_string(),
            }),
        }
    }
}

/// Truthiness of a JSON value: null, false, 0, and empty strings, arrays and objects are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Client for the Crittercism REST API
pub struct CrittercismClient {
    client: Client,
    config: ClientConfig,
    token: String,
    transaction_tokens: TokenCache,
}

impl fmt::Debug for CrittercismClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrittercismClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("token", &"[REDACTED]")
            .field("transaction_tokens", &self.transaction_tokens.len())
            .finish_non_exhaustive()
    }
}

impl CrittercismClient {
    /// Build a client, exchanging the password grant for a token unless one was supplied
    ///
    /// The HTTP client is created once here with the configured timeout and reused
    /// for every call. The primary token obtained (or supplied) at this point is
    /// kept for the lifetime of the client; it is never refreshed.
    ///
    /// # Arguments
    ///
    /// * `config` - Base URL, credentials, timeout, page bound and clock
    ///
    /// # Errors
    ///
    /// * [`CrittercismError::Configuration`] if the credentials are unusable, e.g.
    ///   neither a token nor a password grant was given
    /// * [`CrittercismError::Authentication`] if the server rejects the password grant
    /// * [`CrittercismError::InvalidResponse`] if the token response has no `access_token`
    /// * Any other API or transport error raised by the token exchange
    pub async fn connect(config: ClientConfig) -> CrittercismResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(CrittercismError::Http)?;

        let supplied_token = config.credentials.bearer_token().map(str::to_string);
        let transaction_tokens = TokenCache::new(config.scoped_token_ttl);
        let mut this = Self {
            client,
            config,
            token: String::new(),
            transaction_tokens,
        };

        this.token = match supplied_token {
            Some(token) => token,
            None => this.authenticate(None).await?,
        };

        info!(base_url = %this.config.base_url, "connected to Crittercism API");
        Ok(this)
    }

    /// Exchange the password grant for a bearer token
    ///
    /// Sends a form-encoded `POST /v1.0/token` authorized with the base64-encoded
    /// client id, asking for a token valid for [`TOKEN_DURATION_SECONDS`]. The
    /// returned token is not stored; callers decide whether it becomes the
    /// primary token or a cached scoped one.
    ///
    /// # Arguments
    ///
    /// * `scope` - Optional OAuth scope narrowing the token, e.g.
    ///   `app/{appId}/transactions` for one app's transaction data
    ///
    /// # Returns
    ///
    /// The `access_token` field of the response.
    ///
    /// # Errors
    ///
    /// * [`CrittercismError::Configuration`] if no password grant was configured
    /// * [`CrittercismError::Authentication`] on a 401 from the token endpoint
    /// * [`CrittercismError::InvalidResponse`] if the body has no `access_token`
    pub async fn authenticate(&self, scope: Option<&str>) -> CrittercismResult<String> {
        let grant = self.config.credentials.grant().ok_or_else(|| {
            CrittercismError::config("a password grant is required to request a token")
        })?;

        let mut body = json!({
            "grant_type": "password",
            "username": grant.username(),
            "password": grant.password(),
            "duration": TOKEN_DURATION_SECONDS,
        });
        if let Some(scope) = scope {
            body["scope"] = Value::String(scope.to_string());
        }

        let mut headers = HeaderMap::new();
        let basic = format!("Basic {}", STANDARD.encode(grant.client_id()));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&basic)
                .map_err(|e| CrittercismError::config(format!("invalid client id: {e}")))?,
        );

        let url = self.api_url("token")?;
        let data = self
            .request_helper(Verb::Token, url, &body, None, Some(headers))
            .await?;

        let token = data
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CrittercismError::invalid_response("token response has no access_token")
            })?;

        info!(scope = scope.unwrap_or("default"), "obtained Crittercism token");
        Ok(token.to_string())
    }

    /// Send `verb` to an endpoint under `/v1.0/` with the primary token
    ///
    /// `endpoint` may carry a query string, e.g. `apps?attributes=appName`.
    pub async fn request(
        &self,
        verb: Verb,
        endpoint: &str,
        body: &Value,
    ) -> CrittercismResult<Value> {
        let url = self.api_url(endpoint)?;
        self.send(verb, url, body).await
    }

    /// Apps visible to the account, with the requested attributes
    ///
    /// `None` or an empty list requests every attribute in [`APP_ATTRIBUTES`].
    /// Unrecognized names are passed through to the server as-is.
    pub async fn apps(&self, attributes: Option<&[&str]>) -> CrittercismResult<Vec<App>> {
        let attributes = attributes
            .filter(|attributes| !attributes.is_empty())
            .unwrap_or(&APP_ATTRIBUTES)
            .join(",");
        let mut url = self.api_url("apps")?;
        url.query_pairs_mut().append_pair("attributes", &attributes);

        match self.send(Verb::Get, url, &Value::Null).await? {
            Value::Object(apps) => apps
                .into_iter()
                .map(|(app_id, app_data)| App::new(app_id, app_data))
                .collect(),
            other => Err(CrittercismError::invalid_response(format!(
                "expected apps object, got {other}"
            ))),
        }
    }

    /// Version strings known for an app
    pub async fn app_versions(&self, app_id: &str) -> CrittercismResult<Vec<String>> {
        let mut url = self.api_url("apps")?;
        url.query_pairs_mut()
            .append_pair("attributes", "appVersions");

        let content = self.send(Verb::Get, url, &Value::Null).await?;
        let versions = content
            .get(app_id)
            .and_then(|app| app.get("appVersions"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CrittercismError::invalid_response(format!("no appVersions for app {app_id}"))
            })?;

        versions
            .iter()
            .map(|version| match version {
                Value::String(version) => Ok(version.clone()),
                other => Err(CrittercismError::invalid_response(format!(
                    "app version must be a string, got {other}"
                ))),
            })
            .collect()
    }

    /// `POST /errorMonitoring/graph`
    pub async fn error_monitoring_graph(
        &self,
        request: &ErrorMonitoringRequest,
    ) -> CrittercismResult<ErrorMonitoringGraph> {
        let content = self
            .request(Verb::Post, "errorMonitoring/graph", &json!({ "params": request }))
            .await?;
        Ok(ErrorMonitoringGraph::new(content))
    }

    /// `POST /errorMonitoring/pie`
    pub async fn error_monitoring_pie(
        &self,
        request: &ErrorMonitoringRequest,
    ) -> CrittercismResult<ErrorMonitoringPie> {
        let content = self
            .request(Verb::Post, "errorMonitoring/pie", &json!({ "params": request }))
            .await?;
        Ok(ErrorMonitoringPie::new(content))
    }

    /// `POST /performanceManagement/pie`
    pub async fn performance_management_pie(
        &self,
        request: &PerformanceManagementRequest,
    ) -> CrittercismResult<PerformanceManagementPie> {
        let content = self
            .request(
                Verb::Post,
                "performanceManagement/pie",
                &json!({ "params": request }),
            )
            .await?;
        Ok(PerformanceManagementPie::new(content))
    }

    /// `GET /app/{appId}/crash/counts`
    pub async fn app_crash_counts(&self, app_id: &str) -> CrittercismResult<Value> {
        self.request(Verb::Get, &format!("app/{app_id}/crash/counts"), &Value::Null)
            .await
    }

    /// `GET /app/{appId}/crash/summaries`, optionally limited to crashes seen within `lookback`
    pub async fn app_crash_summaries(
        &self,
        app_id: &str,
        lookback: Option<Duration>,
    ) -> CrittercismResult<Value> {
        self.summaries(&format!("app/{app_id}/crash/summaries"), lookback)
            .await
    }

    /// `GET /app/{appId}/exception/counts`
    pub async fn app_exception_counts(&self, app_id: &str) -> CrittercismResult<Value> {
        self.request(
            Verb::Get,
            &format!("app/{app_id}/exception/counts"),
            &Value::Null,
        )
        .await
    }

    /// `GET /app/{appId}/exception/summaries`, optionally limited to exceptions seen within `lookback`
    pub async fn app_exception_summaries(
        &self,
        app_id: &str,
        lookback: Option<Duration>,
    ) -> CrittercismResult<Value> {
        self.summaries(&format!("app/{app_id}/exception/summaries"), lookback)
            .await
    }

    /// Details of one exception group, with daily occurrences
    pub async fn exception_details(
        &self,
        hash: &str,
        include_diagnostics: bool,
    ) -> CrittercismResult<ExceptionDetails> {
        let mut url = self.api_url(&format!("exception/{hash}"))?;
        url.query_pairs_mut()
            .append_pair("diagnostics", &include_diagnostics.to_string())
            .append_pair("dailyOccurrences", "true");

        let content = self.send(Verb::Get, url, &Value::Null).await?;
        ExceptionDetails::from_json(content)
    }

    /// Crash paginated table for an app, optionally for one version and a lookback window
    ///
    /// `startDate` and `endDate` are both taken from the configured clock in UTC.
    pub async fn crash_paginated_tables(
        &self,
        app_id: &str,
        app_version: Option<&str>,
        lookback: Option<Duration>,
    ) -> CrittercismResult<CrashTable> {
        let mut url = self.api_url(&format!("{app_id}/crash/paginatedtable"))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(app_version) = app_version {
                query.append_pair("appVersion", app_version);
            }
            if let Some(lookback) = lookback {
                let now = self.config.clock.now();
                query
                    .append_pair("startDate", &lookback_start(now, lookback)?)
                    .append_pair("endDate", &format_timestamp(now));
            }
        }
        strip_empty_query(&mut url);

        let content = self.send(Verb::Get, url, &Value::Null).await?;
        Ok(CrashTable::new(content))
    }

    /// Wrap a crash summary as [`CrashDetails`]
    pub fn crash_details(&self, content: Value) -> CrittercismResult<CrashDetails> {
        CrashDetails::from_json(content)
    }

    /// Every page of `/transactions/{appId}/details/change/{period}`
    pub async fn transactions_details(
        &self,
        app_id: &str,
        period: &str,
    ) -> CrittercismResult<Vec<Value>> {
        let url = self.api_url(&format!("transactions/{app_id}/details/change/{period}"))?;
        self.get_paged_transaction_data(app_id, url).await
    }

    /// Fetch `url` and every following page with the app's scoped token
    ///
    /// Follows `pagination.nextPage` by re-requesting `url` with `pageNum=2, 3, ...`.
    /// Stops at the first page without a truthy `nextPage` or at an empty page
    /// (`null`, `{}`, `[]`, `false`, `0` or an empty string). The scoped token for
    /// `app_id` is exchanged on first use and cached for later calls.
    ///
    /// # Arguments
    ///
    /// * `app_id` - App whose scoped transaction token authorizes the calls
    /// * `url` - Absolute URL of the first page; must not already carry `pageNum`
    ///
    /// # Returns
    ///
    /// Every non-empty page, in the order fetched.
    ///
    /// # Errors
    ///
    /// * [`CrittercismError::PageLimitExceeded`] once `max_pages` pages have been
    ///   fetched and the server still reports another
    /// * Any error from the scoped token exchange or from a page request; pages
    ///   fetched before the failure are discarded
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn get_paged_transaction_data(
        &self,
        app_id: &str,
        url: Url,
    ) -> CrittercismResult<Vec<Value>> {
        let token = self.token_for_app(app_id).await?;
        let mut pages = Vec::new();
        let mut page_num: usize = 1;
        let mut page = self
            .request_helper(Verb::Get, url.clone(), &Value::Null, Some(&token), None)
            .await?;

        while is_truthy(&page) {
            let has_next_page = page
                .get("pagination")
                .and_then(|pagination| pagination.get("nextPage"))
                .is_some_and(is_truthy);
            pages.push(page);

            if !has_next_page {
                break;
            }
            if pages.len() >= self.config.max_pages {
                warn!(
                    max_pages = self.config.max_pages,
                    "server still reports more pages, giving up"
                );
                return Err(CrittercismError::PageLimitExceeded {
                    max_pages: self.config.max_pages,
                    url: url.to_string(),
                });
            }

            page_num += 1;
            let mut next_url = url.clone();
            next_url
                .query_pairs_mut()
                .append_pair("pageNum", &page_num.to_string());
            page = self
                .request_helper(Verb::Get, next_url, &Value::Null, Some(&token), None)
                .await?;
        }

        debug!(pages = pages.len(), "fetched paged transaction data");
        Ok(pages)
    }

    /// Number of scoped transaction tokens currently cached
    pub fn cached_transaction_tokens(&self) -> usize {
        self.transaction_tokens.len()
    }

    async fn token_for_app(&self, app_id: &str) -> CrittercismResult<String> {
        if let Some(token) = self.transaction_tokens.get(app_id) {
            return Ok(token);
        }

        let token = self.authenticate(Some(&transaction_scope(app_id))).await?;
        self.transaction_tokens.insert(app_id, token.clone());
        Ok(token)
    }

    async fn summaries(
        &self,
        endpoint: &str,
        lookback: Option<Duration>,
    ) -> CrittercismResult<Value> {
        let mut url = self.api_url(endpoint)?;
        if let Some(lookback) = lookback {
            let start = lookback_start(self.config.clock.now(), lookback)?;
            url.query_pairs_mut()
                .append_pair("lastOccurredStart", &start);
        }
        self.send(Verb::Get, url, &Value::Null).await
    }

    fn api_url(&self, endpoint: &str) -> CrittercismResult<Url> {
        let mut base_url = self.config.base_url.clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        base_url
            .join(&format!("{API_VERSION}/{endpoint}"))
            .map_err(|e| CrittercismError::config(format!("invalid endpoint {endpoint}: {e}")))
    }

    async fn send(&self, verb: Verb, url: Url, body: &Value) -> CrittercismResult<Value> {
        self.request_helper(verb, url, body, Some(&self.token), None)
            .await
    }

    async fn request_helper(
        &self,
        verb: Verb,
        url: Url,
        body: &Value,
        token: Option<&str>,
        extra_headers: Option<HeaderMap>,
    ) -> CrittercismResult<Value> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(SOURCE_HEADER, HeaderValue::from_static(SOURCE_HEADER_VALUE));

        if let Some(token) = token.filter(|token| !token.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| CrittercismError::config(format!("invalid token format: {e}")))?,
            );
        }
        if let Some(extra_headers) = extra_headers {
            headers.extend(extra_headers);
        }

        debug!(verb = %verb, url = %url, "sending Crittercism request");

        let request = self.build_request(verb, url.clone(), body)?.headers(headers);
        let timeout_seconds = self.config.timeout_seconds;
        let response = timeout(Duration::from_secs(timeout_seconds), request.send())
            .await
            .map_err(|_| CrittercismError::Timeout {
                url: url.to_string(),
            })?
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(&url, e))?;

        if let Some(error) = CrittercismError::from_status(RawResponse {
            status,
            url: url.to_string(),
            body: text.clone(),
        }) {
            warn!(status, url = %url, "Crittercism API error: {error}");
            return Err(error);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            CrittercismError::invalid_response(format!("failed to parse body from {url}: {e}"))
        })
    }

    fn build_request(&self, verb: Verb, url: Url, body: &Value) -> CrittercismResult<RequestBuilder> {
        let request = match verb {
            Verb::Get => self.client.get(url),
            Verb::Post => self.client.post(url).json(body),
            Verb::Token => self.client.post(url).form(&form_fields(body)?),
        };
        Ok(request)
    }
}

// reqwest's client-wide timeout can also fire while the body is being read
fn transport_error(url: &Url, error: reqwest::Error) -> CrittercismError {
    if error.is_timeout() {
        CrittercismError::Timeout {
            url: url.to_string(),
        }
    } else {
        CrittercismError::Http(error)
    }
}

fn form_fields(body: &Value) -> CrittercismResult<Vec<(String, String)>> {
    let fields = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Object(fields) => fields,
        other => {
            return Err(CrittercismError::config(format!(
                "form body must be an object, got {other}"
            )));
        }
    };

    Ok(fields
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), value)
        })
        .collect())
}

// `query_pairs_mut` leaves a bare `?` behind when nothing was appended
fn strip_empty_query(url: &mut Url) {
    if url.query() == Some("") {
        url.set_query(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_parsing() {
        assert_eq!("GET".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!("POST".parse::<Verb>().unwrap(), Verb::Post);
        assert_eq!("TOKEN".parse::<Verb>().unwrap(), Verb::Token);

        match "DELETE".parse::<Verb>().unwrap_err() {
            CrittercismError::UnsupportedVerb { verb } => assert_eq!(verb, "DELETE"),
            other => panic!("Expected UnsupportedVerb error, got: {other:?}"),
        }
        assert!("get".parse::<Verb>().is_err());
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!([0])));
        assert!(is_truthy(&json!({"data": null})));
    }

    #[test]
    fn form_fields_stringify_values() {
        let fields = form_fields(&json!({
            "grant_type": "password",
            "duration": TOKEN_DURATION_SECONDS,
        }))
        .unwrap();

        assert!(fields.contains(&("grant_type".to_string(), "password".to_string())));
        assert!(fields.contains(&("duration".to_string(), "31536000".to_string())));
        assert!(form_fields(&Value::Null).unwrap().is_empty());
        assert!(form_fields(&json!(["a"])).is_err());
    }

    #[test]
    fn empty_query_is_stripped() {
        let mut url = Url::parse("https://developers.crittercism.com/v1.0/abc/crash/paginatedtable")
            .unwrap();
        url.query_pairs_mut();
        strip_empty_query(&mut url);
        assert_eq!(url.query(), None);
    }
}
