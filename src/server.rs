/// HTTP server with WebSocket support for snapshot publication
use actix_web::{middleware, web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws;

use crate::config::ViewConfig;
use crate::messages::ServerMessage;
use crate::session::TableSession;
use crate::websocket::{AppState, TableWebSocket};

/// WebSocket endpoint handler
async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let resp = ws::start(TableWebSocket::new(state), &req, stream)?;
    Ok(resp)
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let session = state.session();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "PaperTable server is running",
        "rows": session.store().len(),
        "busy": session.is_busy(),
    }))
}

/// Latest snapshot
async fn snapshot(state: web::Data<AppState>) -> HttpResponse {
    let message = ServerMessage::snapshot(&state.session());
    HttpResponse::Ok().json(message)
}

/// Chart and list stats over the visible rows
async fn stats(state: web::Data<AppState>) -> HttpResponse {
    let report = state.session().stats();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "data": report,
    }))
}

/// Start the HTTP server around a prepared session
pub async fn run_server(config: ViewConfig, session: TableSession) -> std::io::Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let state = web::Data::new(AppState::new(session));

    log::info!("PaperTable server");
    log::info!("WebSocket: ws://{}:{}/ws", host, port);
    log::info!("Snapshot: http://{}:{}/snapshot", host, port);
    log::info!("Stats: http://{}:{}/stats", host, port);
    log::info!("Health check: http://{}:{}/health", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            // CORS for development
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .route("/ws", web::get().to(ws_index))
            .route("/snapshot", web::get().to(snapshot))
            .route("/stats", web::get().to(stats))
            .route("/health", web::get().to(health_check))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
