// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Shared fixtures for Crittercism client integration tests

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{TimeZone, Utc};
use crittercism_client::{ClientConfig, Credentials, CrittercismClient, FixedClock, PasswordGrant};
use serde_json::{Value, json};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

pub const CLIENT_ID: &str = "test-client-id";
pub const USERNAME: &str = "ops@example.com";
pub const PASSWORD: &str = "hunter2";
pub const TOKEN: &str = "primary-token";
pub const APP_ID: &str = "app-1";

pub const TOKEN_PATH: &str = "/v1.0/token";

/// Expected `Authorization` header of the token exchange
pub fn basic_authorization() -> String {
    format!("Basic {}", STANDARD.encode(CLIENT_ID))
}

/// Frozen "now" used by every test client: 2024-03-05T10:30:15Z
pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 15)
            .single()
            .expect("valid fixed timestamp"),
    ))
}

pub fn grant() -> PasswordGrant {
    PasswordGrant::new(CLIENT_ID, USERNAME, PASSWORD).expect("valid grant")
}

/// Config against the mock server with both a password grant and a primary token
pub fn test_config(mock_server: &MockServer) -> ClientConfig {
    config_with_credentials(
        mock_server,
        Credentials::password(grant()).with_token(TOKEN),
    )
}

pub fn config_with_credentials(mock_server: &MockServer, credentials: Credentials) -> ClientConfig {
    ClientConfig {
        timeout_seconds: 5,
        ..ClientConfig::new(credentials)
    }
    .with_base_url(Url::parse(&mock_server.uri()).expect("mock server URI"))
    .with_clock(fixed_clock())
}

/// Client with a pre-supplied primary token; no exchange happens at connect time
pub async fn connected_client(mock_server: &MockServer) -> CrittercismClient {
    CrittercismClient::connect(test_config(mock_server))
        .await
        .expect("client connects")
}

pub fn token_response(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 31_536_000
    })
}

/// Mount the token endpoint, matching `fragment` in the form body
pub async fn mount_token_exchange(
    mock_server: &MockServer,
    fragment: &str,
    access_token: &str,
    expected_calls: u64,
) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("authorization", basic_authorization().as_str()))
        .and(body_string_contains(fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(access_token)))
        .expect(expected_calls)
        .mount(mock_server)
        .await;
}

pub fn transaction_page(items: &[&str], next_page: Option<bool>) -> Value {
    let mut page = json!({ "data": { "items": items } });
    if let Some(next_page) = next_page {
        page["pagination"] = json!({ "nextPage": next_page });
    }
    page
}
