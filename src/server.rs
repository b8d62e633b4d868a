use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use log::{error, info};

use crate::data::{GenerationInput, GenerationOutput};
use crate::report::{self, SectionSummary};
use crate::solver;

type HandlerError = (StatusCode, String);

// A run is synchronous; it goes to the blocking pool. If the client
// disconnects first, the finished result is dropped.
async fn generate_handler(
    Json(input): Json<GenerationInput>,
) -> Result<Json<GenerationOutput>, HandlerError> {
    match tokio::task::spawn_blocking(move || solver::generate(&input)).await {
        Ok(Ok(output)) => Ok(Json(output)),
        Ok(Err(e)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            error!("Generation worker failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "timetable generation failed".to_string(),
            ))
        }
    }
}

async fn summary_handler(Json(input): Json<GenerationInput>) -> Json<Vec<SectionSummary>> {
    Json(report::summarize(&input, &[]))
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/summary", post(summary_handler))
        .route("/health", get(health_handler))
}

pub async fn run_server(addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn week() -> Value {
        json!({
            "config": {"periodsPerDay": 4, "lunchBreakAt": 2},
            "faculty": [{
                "id": "f1",
                "name": "Dr. Rao",
                "subjects": [{"id": "m", "name": "Maths", "type": "subject"}],
                "availability": {
                    "Monday": [true, true, true, false],
                    "Tuesday": [false, false, false, true]
                }
            }],
            "sections": [{"id": "s1", "name": "CSE-A"}],
            "assignments": {"s1": [{
                "id": "a1",
                "facultyId": "f1",
                "subjectId": "m",
                "hours": 3,
                "preferences": [{"kind": "explicit", "day": "Tuesday", "period": 4}]
            }]}
        })
    }

    #[tokio::test]
    async fn generate_returns_grid_and_unassigned() {
        let (status, body) = post_json("/v1/timetable/generate", week()).await;
        assert_eq!(status, StatusCode::OK);

        let output: Value = serde_json::from_slice(&body).unwrap();
        let timetable = &output["timetables"][0];
        assert_eq!(timetable["sectionName"], "CSE-A");
        assert_eq!(timetable["days"][1]["day"], "Tuesday");
        assert_eq!(timetable["days"][1]["periods"][3][0]["subjectName"], "Maths");
        // Period 2 would repeat Maths, 3 is lunch and 4 is unavailable.
        assert_eq!(timetable["days"][0]["periods"][0][0]["facultyName"], "Dr. Rao");
        assert_eq!(timetable["days"][0]["periods"][2], json!([]));
        assert_eq!(timetable["unassigned"].as_array().unwrap().len(), 1);
        assert_eq!(output["periodTimes"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn invalid_config_is_a_bad_request() {
        let mut input = week();
        input["config"]["periodsPerDay"] = json!(0);
        let (status, body) = post_json("/v1/timetable/generate", input).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8(body).unwrap().contains("periodsPerDay"));
    }

    #[tokio::test]
    async fn summary_lists_faculty() {
        let (status, body) = post_json("/v1/timetable/summary", week()).await;
        assert_eq!(status, StatusCode::OK);
        let summaries: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(summaries[0]["faculty"][0]["facultyName"], "Dr. Rao");
        assert_eq!(summaries[0]["load"][0]["sessions"], 3);
        assert_eq!(summaries[0]["weeklyPeriods"], 3);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
