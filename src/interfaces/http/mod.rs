use crate::application::AnalysisSession;
use crate::domain::error::AppError;
use crate::domain::outcome::ExecutionOutcome;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::loader::load_table;
use crate::infrastructure::llm_clients::AgentClient;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub config: AppConfig,
    pub agent: Arc<dyn AgentClient>,
    /// One session at a time; replaced on every upload, dropping the
    /// previous query log with it.
    pub session: tokio::sync::Mutex<Option<AnalysisSession>>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub outcome: ExecutionOutcome,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_queries: usize,
    pub success_rate: f64,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = ErrorBody {
        error: err.to_string(),
    };
    match err {
        AppError::ValidationError(_) | AppError::LoadError(_) => {
            HttpResponse::BadRequest().json(body)
        }
        AppError::Unreachable(_) => HttpResponse::ServiceUnavailable().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

#[post("/upload")]
async fn upload(data: web::Data<HttpState>, body: web::Bytes) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("CSV upload received ({} bytes)", body.len()),
    );

    let table = match load_table(&body) {
        Ok(table) => table,
        Err(err) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Upload rejected: {}", err),
            );
            return error_response(&err);
        }
    };

    let session = match AnalysisSession::new(
        table,
        Arc::clone(&data.agent),
        data.config.agent.clone(),
    ) {
        Ok(session) => session,
        Err(err) => return error_response(&err),
    };

    let summary = session.summary();
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Session {} started: {} rows, {} columns",
            session.id(),
            summary.num_rows,
            summary.num_columns
        ),
    );

    *data.session.lock().await = Some(session);
    HttpResponse::Ok().json(summary)
}

#[post("/ask")]
async fn ask(data: web::Data<HttpState>, req: web::Json<AskRequest>) -> impl Responder {
    if req.question.trim().is_empty() {
        return error_response(&AppError::ValidationError(
            "Question must not be empty".to_string(),
        ));
    }

    let guard = data.session.lock().await;
    let session = match guard.as_ref() {
        Some(session) => session,
        None => {
            return error_response(&AppError::ValidationError(
                "No CSV loaded. Upload a file first.".to_string(),
            ));
        }
    };

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Question: {}", req.question),
    );

    match session.ask(&req.question).await {
        Ok(outcome) => {
            add_log(
                &data.logs,
                if outcome.succeeded() { "INFO" } else { "WARN" },
                "HttpApi",
                &format!("Outcome: {}", outcome.kind()),
            );
            HttpResponse::Ok().json(AskResponse { outcome })
        }
        Err(err) => error_response(&err),
    }
}

#[get("/history")]
async fn history(data: web::Data<HttpState>) -> impl Responder {
    let guard = data.session.lock().await;
    match guard.as_ref() {
        Some(session) => HttpResponse::Ok().json(session.tracker().history()),
        None => HttpResponse::Ok().json(Vec::<crate::domain::outcome::QueryLogEntry>::new()),
    }
}

#[get("/stats")]
async fn stats(data: web::Data<HttpState>) -> impl Responder {
    let guard = data.session.lock().await;
    let (total_queries, success_rate) = match guard.as_ref() {
        Some(session) => (
            session.tracker().total_queries(),
            session.tracker().success_rate(),
        ),
        None => (0, 0.0),
    };
    HttpResponse::Ok().json(StatsResponse {
        total_queries,
        success_rate,
    })
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap().clone();
    HttpResponse::Ok().json(logs)
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap();
    logs.push(entry);
    if logs.len() > 100 {
        logs.remove(0);
    }
}

pub fn start_server(config: AppConfig, agent: Arc<dyn AgentClient>) -> std::io::Result<Server> {
    let bind = (config.bind_host.clone(), config.bind_port);
    let state = web::Data::new(HttpState {
        config,
        agent,
        session: tokio::sync::Mutex::new(None),
        logs: Arc::new(Mutex::new(Vec::new())),
    });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new().wrap(cors).app_data(state.clone()).service(
            web::scope("/api")
                .service(upload)
                .service(ask)
                .service(history)
                .service(stats)
                .service(get_logs),
        )
    })
    .bind(bind)?
    .run();

    Ok(server)
}
