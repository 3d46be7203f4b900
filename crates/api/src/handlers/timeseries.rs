//! Ingest and query handlers. Every call is routed to the store of the
//! caller's tenant.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tsgate_core::error::CoreError;
use tsgate_core::timeseries::{validate_labels, DataPoint, Label, Row, TimeSeriesStore};

use crate::error::{AppError, AppResult};
use crate::handlers::RpcJson;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// One point as sent by clients.
#[derive(Debug, Clone, Deserialize)]
pub struct Datum {
    pub metric: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Unix seconds.
    pub timestamp: i64,
    pub value: f64,
}

impl TryFrom<Datum> for Row {
    type Error = CoreError;

    fn try_from(datum: Datum) -> Result<Self, Self::Error> {
        validate_labels(&datum.labels).map_err(CoreError::InvalidArgument)?;
        Ok(Row {
            metric: datum.metric,
            labels: datum.labels,
            data_point: DataPoint {
                timestamp: datum.timestamp,
                value: datum.value,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkInsertRequest {
    pub data: Vec<Datum>,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub metric: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub data_points: Vec<DataPoint>,
}

/// Empty `{}` acknowledgement.
#[derive(Debug, Default, Serialize)]
pub struct Ack {}

fn tenant_store(state: &AppState, auth: &AuthUser) -> AppResult<Arc<dyn TimeSeriesStore>> {
    let tenant_id = auth.tenant_id();
    state
        .registry
        .get(tenant_id)
        .ok_or(AppError::Core(CoreError::StorageUnavailable { tenant_id }))
}

async fn insert_one(store: &dyn TimeSeriesStore, datum: Datum) -> AppResult<()> {
    let row = Row::try_from(datum)?;
    store
        .insert_rows(std::slice::from_ref(&row))
        .await
        .map_err(AppError::store("insert_rows"))
}

/// POST /tsgate.Gateway/InsertTimeSeriesDatum
pub async fn insert_datum(
    State(state): State<AppState>,
    auth: AuthUser,
    RpcJson(datum): RpcJson<Datum>,
) -> AppResult<Json<Ack>> {
    let store = tenant_store(&state, &auth)?;
    insert_one(store.as_ref(), datum).await?;
    Ok(Json(Ack::default()))
}

/// POST /tsgate.Gateway/InsertBulkTimeSeriesData
///
/// Points are written in order; the first failure ends the call and earlier
/// points stay written.
pub async fn insert_bulk(
    State(state): State<AppState>,
    auth: AuthUser,
    RpcJson(input): RpcJson<BulkInsertRequest>,
) -> AppResult<Json<Ack>> {
    let store = tenant_store(&state, &auth)?;
    for datum in input.data {
        insert_one(store.as_ref(), datum).await?;
    }
    Ok(Json(Ack::default()))
}

/// Longest NDJSON line accepted by streamed ingest, newline excluded.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, PartialEq)]
enum Line {
    Complete(Vec<u8>),
    TooLong,
}

/// Reassembles lines from body chunks. Lines longer than
/// [`MAX_LINE_BYTES`] are reported once and skipped up to their newline.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
    overflowed: bool,
}

impl LineBuffer {
    fn feed(&mut self, mut chunk: &[u8], out: &mut Vec<Line>) {
        loop {
            let newline = chunk.iter().position(|b| *b == b'\n');
            let segment = &chunk[..newline.unwrap_or(chunk.len())];
            if !self.overflowed {
                if self.pending.len() + segment.len() > MAX_LINE_BYTES {
                    self.overflowed = true;
                    self.pending.clear();
                    out.push(Line::TooLong);
                } else {
                    self.pending.extend_from_slice(segment);
                }
            }
            let Some(pos) = newline else {
                return;
            };
            if !self.overflowed {
                out.push(Line::Complete(std::mem::take(&mut self.pending)));
            }
            self.overflowed = false;
            chunk = &chunk[pos + 1..];
        }
    }

    /// The unterminated last line, if any.
    fn finish(self) -> Option<Line> {
        (!self.overflowed && !self.pending.is_empty()).then_some(Line::Complete(self.pending))
    }
}

/// Decode and write one NDJSON line. `None` for blank lines.
async fn ingest_line(store: &dyn TimeSeriesStore, line: Line) -> Option<AppResult<()>> {
    let line = match line {
        Line::Complete(line) => line,
        Line::TooLong => {
            return Some(Err(AppError::Core(CoreError::InvalidArgument(format!(
                "Datum exceeds {MAX_LINE_BYTES} bytes"
            )))))
        }
    };
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    let result = match serde_json::from_slice::<Datum>(line) {
        Ok(datum) => insert_one(store, datum).await,
        Err(e) => Err(AppError::Core(CoreError::InvalidArgument(format!(
            "Invalid datum: {e}"
        )))),
    };
    Some(result)
}

#[derive(Default)]
struct Tally {
    accepted: usize,
    last_error: Option<AppError>,
}

impl Tally {
    fn record(&mut self, result: Option<AppResult<()>>) {
        match result {
            Some(Ok(())) => self.accepted += 1,
            Some(Err(e)) => self.last_error = Some(e),
            None => {}
        }
    }
}

/// POST /tsgate.Gateway/InsertTimeSeriesData
///
/// Streams newline-delimited datums. Every line is attempted; the last
/// failure (if any) is returned once the stream ends. A broken stream stops
/// ingestion immediately and keeps what was already written.
pub async fn insert_stream(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Body,
) -> AppResult<Json<Ack>> {
    let tenant_id = auth.tenant_id();
    let store = tenant_store(&state, &auth)?;

    let mut stream = body.into_data_stream();
    let mut lines = LineBuffer::default();
    let mut ready = Vec::new();
    let mut tally = Tally::default();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(
                    tenant_id,
                    accepted = tally.accepted,
                    error = %e,
                    "Ingest stream broken by client"
                );
                return Err(AppError::InternalError(format!(
                    "Reading ingest stream failed: {e}"
                )));
            }
        };
        lines.feed(&chunk, &mut ready);
        for line in ready.drain(..) {
            tally.record(ingest_line(store.as_ref(), line).await);
        }
    }
    if let Some(line) = lines.finish() {
        tally.record(ingest_line(store.as_ref(), line).await);
    }

    tracing::debug!(tenant_id, accepted = tally.accepted, "Ingest stream finished");

    match tally.last_error {
        Some(e) => Err(e),
        None => Ok(Json(Ack::default())),
    }
}

/// POST /tsgate.Gateway/SelectTimeSeriesData
///
/// Engine errors are logged and answered with an empty result.
pub async fn select(
    State(state): State<AppState>,
    auth: AuthUser,
    RpcJson(input): RpcJson<SelectRequest>,
) -> AppResult<Json<SelectResponse>> {
    let tenant_id = auth.tenant_id();
    let store = tenant_store(&state, &auth)?;

    let data_points = match store
        .select(&input.metric, &input.labels, input.start, input.end)
        .await
    {
        Ok(points) => points,
        Err(e) => {
            tracing::error!(tenant_id, metric = %input.metric, error = %e, "Query failed");
            Vec::new()
        }
    };

    Ok(Json(SelectResponse { data_points }))
}
