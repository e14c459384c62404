mod error;
mod middleware;
mod models;
mod platform;
mod routes;
mod services;

use actix_web::{App, HttpServer, web};
use tracing_subscriber::EnvFilter;

use crate::platform::Platform;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let platform = Platform::from_env()
        .expect("PLATFORM_URL, PLATFORM_ANON_KEY et PLATFORM_SERVICE_KEY sont requis");

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(2203);

    tracing::info!(port, "démarrage du serveur");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(platform.clone()))
            .configure(routes::configure_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
