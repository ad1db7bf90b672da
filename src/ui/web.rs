//! JSON scheduling service.
//!
//! Each request carries its own enrollment snapshot and gets its own graph
//! and coloring; nothing is shared between requests.

use crate::error::{Result, SchedulerError};
use crate::graph::Enrollment;
use crate::schedule::{SchedulePlan, TimetableConfig};
use crate::utils::serialization::ScheduleReport;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use tokio::{net::TcpListener, runtime::Runtime};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScheduleRequest {
    /// Student id to the exams that student takes.
    pub enrollments: BTreeMap<String, Vec<String>>,
    /// Extra exams to schedule even if nobody takes them.
    #[serde(default)]
    pub exams: Vec<String>,
    #[serde(default)]
    pub start_hour: Option<u32>,
    #[serde(default)]
    pub slot_duration: Option<u32>,
}

impl ScheduleRequest {
    pub fn enrollment(&self) -> Enrollment {
        let mut enrollment: Enrollment = self
            .enrollments
            .iter()
            .map(|(student, exams)| (student.as_str(), exams.iter().map(String::as_str)))
            .collect();
        for exam in &self.exams {
            enrollment.add_exam(exam.as_str());
        }
        enrollment
    }

    pub fn timetable_config(&self, defaults: &TimetableConfig) -> TimetableConfig {
        TimetableConfig {
            start_hour: self.start_hour.unwrap_or(defaults.start_hour),
            slot_duration: self.slot_duration.unwrap_or(defaults.slot_duration),
        }
    }

    pub fn plan(&self, defaults: &TimetableConfig) -> Result<SchedulePlan> {
        SchedulePlan::from_enrollment(&self.enrollment(), &self.timetable_config(defaults))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

struct ApiError(SchedulerError);

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            SchedulerError::MalformedEnrollment { .. }
            | SchedulerError::InvalidGraph { .. }
            | SchedulerError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(%status, error = %self.0, "schedule request failed");
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// `defaults` fills in timetable fields a request leaves out.
pub fn router(defaults: TimetableConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/schedule", post(schedule_handler))
        .with_state(defaults)
}

/// Serves the API on `127.0.0.1:port` until the process is stopped.
pub fn serve(port: u16, defaults: TimetableConfig) -> io::Result<()> {
    let runtime = Runtime::new()?;
    runtime.block_on(async move {
        let bind_addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(bind_addr).await?;
        info!(addr = %listener.local_addr()?, "schedule service listening");
        axum::serve(listener, router(defaults)).await
    })
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn schedule_handler(
    State(defaults): State<TimetableConfig>,
    Json(request): Json<ScheduleRequest>,
) -> std::result::Result<Json<ScheduleReport>, ApiError> {
    let plan = request.plan(&defaults)?;
    info!(
        students = request.enrollments.len(),
        exams = plan.graph.node_count(),
        slots = plan.coloring.slot_count(),
        "schedule request served"
    );
    Ok(Json(ScheduleReport::from_plan(&plan)))
}
