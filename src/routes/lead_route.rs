use std::collections::HashMap;
use std::sync::Mutex;

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::output::leads_to_csv;
use crate::pipeline::{Pipeline, RunOutcome};

/// In-memory CSV store, one entry per finished run. Lives for the process
/// lifetime only.
#[derive(Default)]
pub struct ResultsCache {
    entries: Mutex<HashMap<Uuid, String>>,
}

impl ResultsCache {
    pub fn insert(&self, csv: String) -> Uuid {
        let job_id = Uuid::new_v4();
        self.entries.lock().unwrap().insert(job_id, csv);
        job_id
    }

    pub fn get(&self, job_id: &Uuid) -> Option<String> {
        self.entries.lock().unwrap().get(job_id).cloned()
    }
}

/// Guards the generator behind a shared secret set at deploy time.
pub struct SharedApiKey(pub String);

#[derive(Deserialize)]
struct SegmentRequest {
    segments: Vec<String>,
}

#[post("/run-generator")]
async fn run_generator(
    request: HttpRequest,
    body: web::Json<SegmentRequest>,
    pipeline: web::Data<Pipeline>,
    api_key: web::Data<SharedApiKey>,
    results: web::Data<ResultsCache>,
) -> HttpResponse {
    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());
    if presented != Some(api_key.0.as_str()) {
        log::warn!("Unauthorized run-generator request, bad API key");
        return HttpResponse::Forbidden().json(json!({"error": "Unauthorized"}));
    }

    let selected = if body.segments.is_empty() {
        None
    } else {
        Some(body.segments.clone())
    };

    match pipeline.run(selected).await {
        RunOutcome::Leads(leads) => match leads_to_csv(&leads) {
            Ok(csv) => {
                let job_id = results.insert(csv);
                log::info!("Cached CSV under job_id {}", job_id);
                HttpResponse::Ok().json(json!({"job_id": job_id, "leads": leads}))
            }
            Err(e) => {
                log::error!("CSV serialization failed: {:#}", e);
                HttpResponse::InternalServerError()
                    .json(json!({"error": "CSV serialization failed", "details": format!("{e:#}")}))
            }
        },
        RunOutcome::Empty { message } => HttpResponse::Ok().json(json!({"message": message})),
        RunOutcome::Failed { error, details } => {
            log::error!("Run failed: {} ({})", error, details);
            HttpResponse::InternalServerError().json(json!({"error": error, "details": details}))
        }
    }
}

#[get("/results/{job_id}")]
async fn get_results(path: web::Path<Uuid>, results: web::Data<ResultsCache>) -> HttpResponse {
    let job_id = path.into_inner();
    match results.get(&job_id) {
        Some(csv) => HttpResponse::Ok()
            .content_type("text/csv")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=\"leads.csv\"",
            ))
            .body(csv),
        None => {
            HttpResponse::NotFound().json(json!({"error": "Result not found or expired"}))
        }
    }
}
