use std::sync::Arc;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use transfer_idp::app::create_app;
use transfer_idp::config::Settings;
use transfer_idp::directory::LdapDirectory;
use transfer_idp::models;
use transfer_idp::routes;
use transfer_idp::storage::S3Storage;

#[derive(OpenApi)]
#[openapi(
    paths(routes::authorize::authorize, routes::health::health),
    components(schemas(
        models::AuthorizationRequest,
        models::AuthorizationGrant,
        routes::health::HealthResponse
    )),
    tags(
        (name = "Authorization", description = "Login-to-grant authorization hook"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let settings = Settings::from_env()?;
    let directory = Arc::new(LdapDirectory::new(
        settings.directory_url.clone(),
        settings.directory_base_dn.clone(),
    ));
    let storage = Arc::new(S3Storage::from_env()?);

    let app = create_app(settings, directory, storage)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
