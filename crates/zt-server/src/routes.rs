//! Handlers for the `/time/*` endpoints.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use zt_core::aggregate::{self, Report, Stats};
use zt_core::export::{self, ExportFormat, ReportDocument};
use zt_core::{EntryDetails, EntryView, PeriodKind, manual, timer, timestamp};

use crate::AppState;
use crate::auth::Owner;
use crate::error::{ApiError, Envelope, failure};
use crate::request::{
    CreateRequest, ENTRY_ID_REQUIRED, IdRequest, PeriodQuery, StartRequest, StopRequest,
    TIMER_ID_REQUIRED, UpdateRequest, parse_body, required_id,
};

const START_FAILED: &str = "Fehler beim Starten des Timers";
const STOP_FAILED: &str = "Fehler beim Stoppen des Timers";
const CREATE_FAILED: &str = "Fehler beim Erstellen des Eintrags";
const UPDATE_FAILED: &str = "Fehler beim Aktualisieren";
const DELETE_FAILED: &str = "Fehler beim Löschen";
const GET_FAILED: &str = "Fehler beim Laden";
const LIST_FAILED: &str = "Fehler beim Laden der Einträge";
const STATS_FAILED: &str = "Fehler beim Laden der Statistiken";
const REPORTS_FAILED: &str = "Fehler beim Laden der Berichte";
const EXPORT_FAILED: &str = "Fehler beim Export";

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

type ApiResult<T> = Result<Envelope<T>, ApiError>;

pub async fn start(
    State(state): State<AppState>,
    owner: Owner,
    body: Bytes,
) -> ApiResult<EntryDetails> {
    let request: StartRequest = parse_body(&body)?;
    let input = request.into_input().map_err(failure(START_FAILED))?;
    let message = if input.is_break {
        "Pause gestartet"
    } else {
        "Timer gestartet"
    };

    let details = state
        .with_db(START_FAILED, move |db| timer::start(db, &owner.id, input))
        .await?;
    Ok(Envelope::with_message(details, message))
}

pub async fn stop(
    State(state): State<AppState>,
    owner: Owner,
    body: Bytes,
) -> ApiResult<EntryDetails> {
    let request: StopRequest = parse_body(&body)?;
    let id = required_id(request.id, TIMER_ID_REQUIRED)?;

    let details = state
        .with_db(STOP_FAILED, move |db| {
            timer::stop(db, &owner.id, &id, request.description.as_deref())
        })
        .await?;
    Ok(Envelope::with_message(details, "Timer gestoppt"))
}

pub async fn create(
    State(state): State<AppState>,
    owner: Owner,
    body: Bytes,
) -> ApiResult<EntryDetails> {
    let request: CreateRequest = parse_body(&body)?;
    let input = request
        .into_input(state.settings.calendar.zone)
        .map_err(failure(CREATE_FAILED))?;

    let details = state
        .with_db(CREATE_FAILED, move |db| manual::create(db, &owner.id, input))
        .await?;
    Ok(Envelope::with_message(details, "Eintrag erstellt"))
}

pub async fn update(
    State(state): State<AppState>,
    owner: Owner,
    body: Bytes,
) -> ApiResult<EntryDetails> {
    let request: UpdateRequest = parse_body(&body)?;
    let (id, patch) = request
        .into_patch(state.settings.calendar.zone)
        .map_err(failure(UPDATE_FAILED))?;
    let id = required_id(id, ENTRY_ID_REQUIRED)?;

    let policy = state.settings.bounds_policy;
    let details = state
        .with_db(UPDATE_FAILED, move |db| {
            manual::update(db, &owner.id, &id, patch, policy)
        })
        .await?;
    Ok(Envelope::with_message(details, "Eintrag aktualisiert"))
}

pub async fn delete(
    State(state): State<AppState>,
    owner: Owner,
    body: Bytes,
) -> ApiResult<()> {
    let request: IdRequest = parse_body(&body)?;
    let id = required_id(request.id, ENTRY_ID_REQUIRED)?;

    state
        .with_db(DELETE_FAILED, move |db| manual::delete(db, &owner.id, &id))
        .await?;
    Ok(Envelope::message("Eintrag gelöscht"))
}

pub async fn list(
    State(state): State<AppState>,
    owner: Owner,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Vec<EntryView>> {
    let Query(query) = query?;
    let calendar = state.settings.calendar;
    let now = timestamp::now();
    let scope = query.scope(PeriodKind::Today, calendar.today(now));

    let query = scope.query(&calendar);
    let entries = state
        .with_db(LIST_FAILED, move |db| {
            manual::list_at(&*db, &owner.id, &query, now)
        })
        .await?;
    Ok(Envelope::data(entries))
}

pub async fn get(
    State(state): State<AppState>,
    owner: Owner,
    query: Result<Query<IdRequest>, QueryRejection>,
) -> ApiResult<EntryView> {
    let Query(query) = query?;
    let id = required_id(query.id, ENTRY_ID_REQUIRED)?;

    let details = state
        .with_db(GET_FAILED, move |db| manual::get(&*db, &owner.id, &id))
        .await?;
    Ok(Envelope::data(details.into_view(timestamp::now())))
}

pub async fn stats(State(state): State<AppState>, owner: Owner) -> ApiResult<Stats> {
    let calendar = state.settings.calendar;
    let stats = state
        .with_db(STATS_FAILED, move |db| {
            aggregate::stats(&*db, &owner.id, &calendar, timestamp::now())
        })
        .await?;
    Ok(Envelope::data(stats))
}

pub async fn reports(
    State(state): State<AppState>,
    owner: Owner,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Report> {
    let Query(query) = query?;
    let calendar = state.settings.calendar;
    let scope = query.scope(PeriodKind::Week, calendar.today(timestamp::now()));

    let report = state
        .with_db(REPORTS_FAILED, move |db| {
            aggregate::report(&*db, &owner.id, &scope, &calendar)
        })
        .await?;
    Ok(Envelope::data(report))
}

pub async fn export(
    State(state): State<AppState>,
    owner: Owner,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let format = ExportFormat::parse(query.format.as_deref()).map_err(failure(EXPORT_FAILED))?;
    let calendar = state.settings.calendar;
    let now = timestamp::now();
    let today = calendar.today(now);
    let scope = query.scope(PeriodKind::Month, today);

    let range = scope.range;
    let owner_id = owner.id.clone();
    let entries = state
        .with_db(EXPORT_FAILED, move |db| {
            export::entries(&*db, &owner_id, &scope, &calendar)
        })
        .await?;
    tracing::info!(owner = %owner.id, ?format, entries = entries.len(), "export");

    match format {
        ExportFormat::Csv => {
            let disposition = format!("attachment; filename=\"{}\"", export::csv_filename(today));
            let headers = [
                (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ];
            Ok((headers, export::csv(&entries, &calendar)).into_response())
        }
        ExportFormat::Pdf => {
            let document: ReportDocument = export::document(
                &entries,
                range,
                owner.display_name(),
                now,
                &calendar,
            );
            Ok(Envelope::data(document).into_response())
        }
    }
}
