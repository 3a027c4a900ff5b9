// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Response models and request parameter objects
//!
//! Response models are thin read-only projections of the JSON the API returned;
//! none of them can be serialized back. Only the request parameter objects are
//! `Serialize`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CrittercismError, CrittercismResult};

/// Attribute names the `/apps` endpoint recognizes, requested by default
pub const APP_ATTRIBUTES: [&str; 13] = [
    "appName",
    "appType",
    "appVersions",
    "crashPercent",
    "dau",
    "latency",
    "latestAppStoreReleaseDate",
    "latestVersionString",
    "linkToAppStore",
    "iconURL",
    "mau",
    "rating",
    "role",
];

/// Field the crash ETL injects into crash summaries
pub const DAILY_OCCURRENCES_BY_VERSION: &str = "daily_occurrences_by_version";

fn expect_object(value: Value, what: &str) -> CrittercismResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CrittercismError::invalid_response(format!(
            "expected {what} to be a JSON object, got {other}"
        ))),
    }
}

/// A mobile application and the attributes requested for it
#[derive(Debug, Clone, PartialEq)]
pub struct App {
    id: String,
    attributes: Map<String, Value>,
}

impl App {
    /// Build an app from its id and the attribute object the API returned
    pub fn new(id: impl Into<String>, attributes: Value) -> CrittercismResult<Self> {
        Ok(Self {
            id: id.into(),
            attributes: expect_object(attributes, "app attributes")?,
        })
    }

    /// App identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// All returned attributes
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// `appName`, when requested
    pub fn name(&self) -> Option<&str> {
        self.attribute("appName").and_then(Value::as_str)
    }

    /// `appVersions`, when requested; non-string entries are skipped
    pub fn versions(&self) -> Vec<String> {
        self.attribute("appVersions")
            .and_then(Value::as_array)
            .map(|versions| {
                versions
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A crash group, optionally enriched with per-version daily occurrences
#[derive(Debug, Clone, PartialEq)]
pub struct CrashDetails {
    fields: Map<String, Value>,
    daily_occurrences_by_version: Option<Map<String, Value>>,
}

impl CrashDetails {
    /// Wrap a crash JSON object
    ///
    /// A `daily_occurrences_by_version` object, if present, is lifted out of the
    /// fields into its typed accessor; `null` means no per-version data.
    pub fn from_json(content: Value) -> CrittercismResult<Self> {
        let mut fields = expect_object(content, "crash")?;
        let daily_occurrences_by_version = match fields.remove(DAILY_OCCURRENCES_BY_VERSION) {
            None | Some(Value::Null) => None,
            Some(Value::Object(by_version)) => Some(by_version),
            Some(other) => {
                return Err(CrittercismError::invalid_response(format!(
                    "{DAILY_OCCURRENCES_BY_VERSION} must be an object, got {other}"
                )));
            }
        };

        Ok(Self {
            fields,
            daily_occurrences_by_version,
        })
    }

    /// Crash group hash
    pub fn hash(&self) -> Option<&str> {
        self.fields.get("hash").and_then(Value::as_str)
    }

    /// Raw field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All crash fields, excluding the per-version breakdown
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Daily occurrences keyed by app version, if any version reported this crash
    pub fn daily_occurrences_by_version(&self) -> Option<&Map<String, Value>> {
        self.daily_occurrences_by_version.as_ref()
    }
}

/// A handled exception group
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionDetails {
    fields: Map<String, Value>,
}

impl ExceptionDetails {
    /// Wrap an exception JSON object
    pub fn from_json(content: Value) -> CrittercismResult<Self> {
        Ok(Self {
            fields: expect_object(content, "exception")?,
        })
    }

    /// Exception group hash
    pub fn hash(&self) -> Option<&str> {
        self.fields.get("hash").and_then(Value::as_str)
    }

    /// Raw field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// `dailyOccurrences` series, requested on every details call
    pub fn daily_occurrences(&self) -> Option<&Vec<Value>> {
        self.field("dailyOccurrences").and_then(Value::as_array)
    }

    /// `diagnostics`, present only when requested
    pub fn diagnostics(&self) -> Option<&Value> {
        self.field("diagnostics")
    }
}

/// One page of the crash paginated table
#[derive(Debug, Clone, PartialEq)]
pub struct CrashTable {
    content: Value,
}

impl CrashTable {
    /// Wrap a paginated table response
    pub fn new(content: Value) -> Self {
        Self { content }
    }

    /// Error summaries under `data.errors`
    pub fn errors(&self) -> CrittercismResult<&[Value]> {
        self.content
            .get("data")
            .and_then(|data| data.get("errors"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                CrittercismError::invalid_response("paginated table has no data.errors array")
            })
    }

    /// The response exactly as returned
    pub fn raw(&self) -> &Value {
        &self.content
    }
}

/// Result of `POST /errorMonitoring/graph`
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMonitoringGraph {
    content: Value,
}

impl ErrorMonitoringGraph {
    /// Wrap a graph response
    pub fn new(content: Value) -> Self {
        Self { content }
    }

    /// The `data` section
    pub fn data(&self) -> Option<&Value> {
        self.content.get("data")
    }

    /// Graph series under `data.series`
    pub fn series(&self) -> &[Value] {
        self.data()
            .and_then(|data| data.get("series"))
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// The response exactly as returned
    pub fn raw(&self) -> &Value {
        &self.content
    }
}

/// Result of `POST /errorMonitoring/pie`
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMonitoringPie {
    content: Value,
}

impl ErrorMonitoringPie {
    /// Wrap a pie response
    pub fn new(content: Value) -> Self {
        Self { content }
    }

    /// Pie slices under `data.slices`
    pub fn slices(&self) -> &[Value] {
        pie_slices(&self.content)
    }

    /// The response exactly as returned
    pub fn raw(&self) -> &Value {
        &self.content
    }
}

/// Result of `POST /performanceManagement/pie`
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceManagementPie {
    content: Value,
}

impl PerformanceManagementPie {
    /// Wrap a pie response
    pub fn new(content: Value) -> Self {
        Self { content }
    }

    /// Pie slices under `data.slices`
    pub fn slices(&self) -> &[Value] {
        pie_slices(&self.content)
    }

    /// The response exactly as returned
    pub fn raw(&self) -> &Value {
        &self.content
    }
}

fn pie_slices(content: &Value) -> &[Value] {
    content
        .get("data")
        .and_then(|data| data.get("slices"))
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// Parameters for the error monitoring graph and pie endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMonitoringRequest {
    /// Apps to include
    pub app_ids: Vec<String>,
    /// Metric to chart, e.g. `crashes`, `crashPercent`, `dau`
    pub graph: String,
    /// Window length in minutes
    pub duration: u32,
    /// Grouping for pie charts, e.g. `appVersion`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Additional filters, e.g. `{"appVersion": "1.2.3"}`
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub filters: Map<String, Value>,
}

impl ErrorMonitoringRequest {
    /// Request a metric for the given apps over `duration` minutes
    pub fn new(app_ids: Vec<String>, graph: impl Into<String>, duration: u32) -> Self {
        Self {
            app_ids,
            graph: graph.into(),
            duration,
            group_by: None,
            filters: Map::new(),
        }
    }

    /// Group results, used by the pie endpoint
    #[must_use]
    pub fn group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    /// Add a filter
    #[must_use]
    pub fn filter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }
}

/// Parameters for the performance management pie endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceManagementRequest {
    /// Apps to include
    pub app_ids: Vec<String>,
    /// Metric, e.g. `volume`, `errors`, `latency`, `dataIn`, `dataOut`
    pub graph: String,
    /// Window length in minutes
    pub duration: u32,
    /// Grouping, e.g. `service`, `carrier`, `device`
    pub group_by: String,
    /// Additional filters
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub filters: Map<String, Value>,
}

impl PerformanceManagementRequest {
    /// Request a grouped metric for the given apps over `duration` minutes
    pub fn new(
        app_ids: Vec<String>,
        graph: impl Into<String>,
        duration: u32,
        group_by: impl Into<String>,
    ) -> Self {
        Self {
            app_ids,
            graph: graph.into(),
            duration,
            group_by: group_by.into(),
            filters: Map::new(),
        }
    }

    /// Add a filter
    #[must_use]
    pub fn filter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn app_accessors() {
        let app = App::new(
            "abc",
            json!({"appName": "Shop", "appVersions": ["1.0", "1.1", 7]}),
        )
        .unwrap();

        assert_eq!(app.id(), "abc");
        assert_eq!(app.name(), Some("Shop"));
        assert_eq!(app.versions(), vec!["1.0", "1.1"]);
        assert!(app.attribute("dau").is_none());
    }

    #[test]
    fn app_requires_object() {
        assert!(App::new("abc", json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn crash_details_lifts_version_breakdown() {
        let crash = CrashDetails::from_json(json!({
            "hash": "A",
            "name": "NullPointerException",
            "daily_occurrences_by_version": {"v2": 5, "v1": 3}
        }))
        .unwrap();

        assert_eq!(crash.hash(), Some("A"));
        assert!(crash.field(DAILY_OCCURRENCES_BY_VERSION).is_none());

        let by_version = crash.daily_occurrences_by_version().unwrap();
        let versions: Vec<_> = by_version.keys().map(String::as_str).collect();
        assert_eq!(versions, vec!["v2", "v1"]);
        assert_eq!(by_version["v1"], json!(3));
    }

    #[test]
    fn crash_details_without_breakdown() {
        let crash = CrashDetails::from_json(json!({"hash": "B"})).unwrap();
        assert!(crash.daily_occurrences_by_version().is_none());

        let crash =
            CrashDetails::from_json(json!({"hash": "B", "daily_occurrences_by_version": null}))
                .unwrap();
        assert!(crash.daily_occurrences_by_version().is_none());

        assert!(
            CrashDetails::from_json(json!({"hash": "B", "daily_occurrences_by_version": 3}))
                .is_err()
        );
    }

    #[test]
    fn crash_table_errors() {
        let table = CrashTable::new(json!({"data": {"errors": [{"hash": "A"}]}}));
        assert_eq!(table.errors().unwrap().len(), 1);

        let table = CrashTable::new(json!({"data": {}}));
        assert!(table.errors().is_err());
    }

    #[test]
    fn chart_accessors_tolerate_missing_sections() {
        let pie = ErrorMonitoringPie::new(json!({"data": {"slices": [{"label": "1.0"}]}}));
        assert_eq!(pie.slices().len(), 1);

        let pie = PerformanceManagementPie::new(json!({}));
        assert!(pie.slices().is_empty());

        let graph = ErrorMonitoringGraph::new(json!({"data": {"series": []}}));
        assert!(graph.series().is_empty());
        assert!(graph.data().is_some());
    }

    #[test]
    fn error_monitoring_request_params() {
        let request = ErrorMonitoringRequest::new(vec!["abc".to_string()], "crashes", 1440)
            .group_by("appVersion")
            .filter("carrier", "Verizon");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "appIds": ["abc"],
                "graph": "crashes",
                "duration": 1440,
                "groupBy": "appVersion",
                "filters": {"carrier": "Verizon"}
            })
        );

        let request = ErrorMonitoringRequest::new(vec!["abc".to_string()], "dau", 60);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"appIds": ["abc"], "graph": "dau", "duration": 60})
        );
    }

    #[test]
    fn performance_management_request_params() {
        let request =
            PerformanceManagementRequest::new(vec!["abc".to_string()], "errors", 60, "service");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"appIds": ["abc"], "graph": "errors", "duration": 60, "groupBy": "service"})
        );
    }
}
