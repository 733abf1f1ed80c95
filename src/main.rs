use actix_web::{web, App, HttpServer};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel::Connection;
use log::{error, info};
use std::env;
use std::sync::Arc;

use mealgate::config::{AppConfig, DB_INIT_SQL};
use mealgate::handlers::{
    change_email, change_password, change_username, delete_account, health_check, login, logout,
    signup, update_diet_restrictions, update_security_key,
};
use mealgate::logger::setup_logger;
use mealgate::middleware::RequestLogger;
use mealgate::store::{AccountStore, PgStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables and initialize logger
    dotenvy::dotenv().ok();
    setup_logger();

    // Get host and port from environment or use defaults
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a number");

    // Connecting to database
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    info!("Connecting to database: {}", db_url);

    // Provision the schema before taking traffic
    let mut conn = PgConnection::establish(&db_url)
        .expect("Failed to establish connection for schema provisioning");
    conn.batch_execute(DB_INIT_SQL)
        .expect("Failed to execute database initialization script");
    info!("Database initialization complete.");

    // Set up database connection pool
    let manager = ConnectionManager::<PgConnection>::new(db_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create database connection pool");

    // Load and validate configuration
    let config = AppConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        panic!("Invalid configuration: {}", e);
    }

    let store: Arc<dyn AccountStore> = Arc::new(PgStore::new(pool));

    info!("Starting HTTP server at http://{}:{}", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            // Enable request logger middleware
            .wrap(RequestLogger)
            // Register app data
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::new(config.clone()))
            // Account routes
            .service(signup)
            .service(login)
            .service(logout)
            .service(change_username)
            .service(change_password)
            .service(change_email)
            .service(update_security_key)
            .service(update_diet_restrictions)
            .service(delete_account)
            // Ops routes
            .service(web::scope("/api").service(health_check))
    })
    .workers(2) // Specify number of workers
    .keep_alive(std::time::Duration::from_secs(75)) // Configure keep-alive
    .shutdown_timeout(30) // Graceful shutdown timeout in seconds
    .bind((host, port))?
    .run()
    .await
}
