//! Posesión efectiva form server
//!
//! HTTP front for the form engine in `posesion-core`. Receives an
//! estate case record as JSON, fills the Registro Civil Formulario 2.1
//! template and streams the finished PDF back. Also persists draft
//! case files so a half-entered form can be resumed, and serves the
//! static form UI.
//!
//! The template PDF is read per request, so replacing the file on disk
//! takes effect without a restart.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use posesion_core::LayoutRegistry;

mod api;
mod error;
#[cfg(test)]
mod tests;

use api::{
    handle_generate_pdf, handle_health, handle_list_drafts, handle_load_draft, handle_save_draft,
};

/// Command-line arguments for the posesión efectiva server
#[derive(Parser, Debug)]
#[command(name = "posesion-server")]
#[command(about = "Posesión efectiva server - fills Formulario 2.1 from estate case records")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Blank Formulario 2.1 template PDF
    #[arg(long, default_value = "formulario_2_1.pdf")]
    template: PathBuf,

    /// Layout registry JSON overriding the built-in Formulario 2.1 layout
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Directory for stored draft case files
    #[arg(long, default_value = "borradores")]
    drafts_dir: PathBuf,

    /// Directory with the static form UI
    #[arg(long, default_value = "public")]
    public_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Template PDF path, read per request
    pub template_path: PathBuf,
    /// Directory holding draft case files
    pub drafts_dir: PathBuf,
    /// Validated form layout, shared read-only
    pub registry: Arc<LayoutRegistry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting posesión efectiva server on {}:{}",
        args.host, args.port
    );

    // Load the form layout once; handlers share it read-only
    let registry = match &args.layout {
        Some(path) => {
            info!("Loading layout registry from {}", path.display());
            LayoutRegistry::from_path(path)?
        }
        None => LayoutRegistry::builtin().clone(),
    };
    info!("Layout registry {} loaded", registry.version);

    if !args.template.is_file() {
        warn!(
            "Template PDF {} not found; /api/generar-pdf will fail until it exists",
            args.template.display()
        );
    }

    std::fs::create_dir_all(&args.drafts_dir)?;

    let state = AppState {
        template_path: args.template.clone(),
        drafts_dir: args.drafts_dir.clone(),
        registry: Arc::new(registry),
    };

    // The form UI is served from another origin during development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/generar-pdf", post(handle_generate_pdf))
        .route("/api/guardar-borrador", post(handle_save_draft))
        .route("/api/borradores", get(handle_list_drafts))
        .route("/api/cargar-borrador/:archivo", get(handle_load_draft))
        // Static form UI
        .fallback_service(ServeDir::new(&args.public_dir))
        .layer(cors)
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Template: {}", args.template.display());
    info!("Drafts directory: {}", args.drafts_dir.display());

    axum::serve(listener, app).await?;

    Ok(())
}
