//! Request payloads and their conversion into tracker inputs.
//!
//! Field names are snake_case; camelCase aliases are accepted. Reference ids
//! may arrive as strings or numbers, and `""`, `0` or `null` mean "none".

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use zt_core::timestamp::parse_timestamp;
use zt_core::{
    EntryId, EntryPatch, NewEntry, PeriodKind, PeriodSelection, ProjectId, Scope, StartTimer,
    TaskId, TrackerError,
};

use crate::error::ApiError;

pub const TIMER_ID_REQUIRED: &str = "Timer ID erforderlich";
pub const ENTRY_ID_REQUIRED: &str = "Eintrag ID erforderlich";

/// Parses a JSON body. An empty body counts as `{}`.
pub fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(ApiError::from)
}

/// Normalizes a raw reference id; blank and `0` mean none.
fn normalize_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty() && trimmed != "0").then(|| trimmed.to_string())
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(text) => normalize_id(&text),
        Value::Number(number) => normalize_id(&number.to_string()),
        _ => None,
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(id_from_value))
}

/// Present fields yield `Some`, so `null` clears while absence leaves the
/// reference untouched.
fn patch_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<String>>, D::Error> {
    Ok(Some(lenient_id(deserializer)?))
}

fn flag_from_value(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => matches!(text.trim(), "1" | "true" | "on" | "yes"),
        _ => false,
    }
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.is_some_and(|value| flag_from_value(&value)))
}

fn optional_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.map(|value| flag_from_value(&value)))
}

fn project(raw: Option<String>) -> Result<Option<ProjectId>, TrackerError> {
    Ok(raw.map(ProjectId::new).transpose()?)
}

fn task(raw: Option<String>) -> Result<Option<TaskId>, TrackerError> {
    Ok(raw.map(TaskId::new).transpose()?)
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|text| !text.trim().is_empty())
}

/// Parses a required entry id, answering 400 with `message` when missing.
pub fn required_id(raw: Option<String>, message: &'static str) -> Result<EntryId, ApiError> {
    raw.and_then(|id| EntryId::new(id).ok())
        .ok_or_else(|| ApiError::bad_request(message))
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    #[serde(default, alias = "projectId", deserialize_with = "lenient_id")]
    pub project_id: Option<String>,
    #[serde(
        default,
        alias = "taskId",
        alias = "todo_id",
        alias = "todoId",
        deserialize_with = "lenient_id"
    )]
    pub task_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "isBreak", deserialize_with = "lenient_flag")]
    pub is_break: bool,
}

impl StartRequest {
    pub fn into_input(self) -> Result<StartTimer, TrackerError> {
        Ok(StartTimer {
            project_id: project(self.project_id)?,
            task_id: task(self.task_id)?,
            description: self.description,
            is_break: self.is_break,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StopRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRequest {
    #[serde(default, alias = "projectId", deserialize_with = "lenient_id")]
    pub project_id: Option<String>,
    #[serde(
        default,
        alias = "taskId",
        alias = "todo_id",
        alias = "todoId",
        deserialize_with = "lenient_id"
    )]
    pub task_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "startTime")]
    pub start_time: Option<String>,
    #[serde(default, alias = "endTime")]
    pub end_time: Option<String>,
    #[serde(default, alias = "isBreak", deserialize_with = "lenient_flag")]
    pub is_break: bool,
}

impl CreateRequest {
    pub fn into_input(self, zone: Tz) -> Result<NewEntry, TrackerError> {
        let (start_time, end_time) =
            NewEntry::parse_bounds(self.start_time.as_deref(), self.end_time.as_deref(), zone)?;
        Ok(NewEntry {
            project_id: project(self.project_id)?,
            task_id: task(self.task_id)?,
            description: self.description,
            start_time,
            end_time,
            is_break: self.is_break,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, alias = "projectId", deserialize_with = "patch_id")]
    pub project_id: Option<Option<String>>,
    #[serde(
        default,
        alias = "taskId",
        alias = "todo_id",
        alias = "todoId",
        deserialize_with = "patch_id"
    )]
    pub task_id: Option<Option<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "startTime")]
    pub start_time: Option<String>,
    #[serde(default, alias = "endTime")]
    pub end_time: Option<String>,
    #[serde(default, alias = "isBreak", deserialize_with = "optional_flag")]
    pub is_break: Option<bool>,
}

impl UpdateRequest {
    /// Splits into the target id (still raw) and the patch.
    pub fn into_patch(self, zone: Tz) -> Result<(Option<String>, EntryPatch), TrackerError> {
        let parse = |raw: Option<&str>| non_blank(raw).map(|text| parse_timestamp(text, zone));
        let patch = EntryPatch {
            project_id: self.project_id.map(project).transpose()?,
            task_id: self.task_id.map(task).transpose()?,
            description: self.description,
            start_time: parse(self.start_time.as_deref()).transpose()?,
            end_time: parse(self.end_time.as_deref()).transpose()?,
            is_break: self.is_break,
        };
        Ok((self.id, patch))
    }
}

/// Body of `DELETE /time/delete` and query of `GET /time/get`.
#[derive(Debug, Default, Deserialize)]
pub struct IdRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
}

/// Query shared by list, reports and export.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
    #[serde(default, alias = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(default, alias = "dateTo")]
    pub date_to: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl PeriodQuery {
    /// Resolves the period on the day `today`, using `default_kind` when no
    /// tag was sent.
    pub fn scope(&self, default_kind: PeriodKind, today: NaiveDate) -> Scope {
        let selection = PeriodSelection::from_query(
            self.period.as_deref(),
            self.date_from.as_deref(),
            self.date_to.as_deref(),
            default_kind,
        );
        let project_id = self
            .project_id
            .as_deref()
            .and_then(normalize_id)
            .and_then(|id| ProjectId::new(id).ok());
        Scope::resolve(&selection, project_id, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_numbers_and_camel_case() {
        let request: StartRequest =
            parse_body(br#"{"projectId": 7, "isBreak": 1, "description": "Pause"}"#).unwrap();
        let input = request.into_input().unwrap();
        assert_eq!(input.project_id, Some(ProjectId::new("7").unwrap()));
        assert!(input.is_break);
    }

    #[test]
    fn zero_and_blank_ids_mean_none() {
        let request: StartRequest = parse_body(br#"{"project_id": 0, "task_id": ""}"#).unwrap();
        let input = request.into_input().unwrap();
        assert_eq!(input.project_id, None);
        assert_eq!(input.task_id, None);
        assert!(!input.is_break);
    }

    #[test]
    fn empty_body_is_default() {
        let request: StartRequest = parse_body(b"").unwrap();
        assert_eq!(request.into_input().unwrap(), StartTimer::default());
    }

    #[test]
    fn malformed_body_is_rejected() {
        let err = parse_body::<StartRequest>(b"{not json").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn patch_distinguishes_absent_from_cleared() {
        let request: UpdateRequest = parse_body(br#"{"id": 3, "project_id": null}"#).unwrap();
        let (id, patch) = request.into_patch(Tz::UTC).unwrap();
        assert_eq!(id.as_deref(), Some("3"));
        assert_eq!(patch.project_id, Some(None));
        assert_eq!(patch.task_id, None);
        assert!(!patch.touches_bounds());
    }

    #[test]
    fn patch_parses_local_bounds() {
        let request: UpdateRequest =
            parse_body(br#"{"id": "e1", "endTime": "2024-03-04 10:30:00", "start_time": ""}"#)
                .unwrap();
        let (_, patch) = request.into_patch(chrono_tz::Europe::Berlin).unwrap();
        assert_eq!(patch.start_time, None);
        assert_eq!(
            patch.end_time.map(|t| t.to_rfc3339()),
            Some("2024-03-04T09:30:00+00:00".to_string())
        );
    }

    #[test]
    fn required_id_reports_missing() {
        let err = required_id(None, TIMER_ID_REQUIRED).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(required_id(Some("e1".into()), TIMER_ID_REQUIRED).unwrap().as_str(), "e1");
    }

    #[test]
    fn period_query_defaults_and_filters() {
        let query = PeriodQuery {
            project_id: Some("0".to_string()),
            ..PeriodQuery::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let scope = query.scope(PeriodKind::Week, today);
        assert_eq!(scope.kind, PeriodKind::Week);
        assert_eq!(scope.project_id, None);
        assert_eq!(scope.range.from, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }
}
