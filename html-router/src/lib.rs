pub mod error;
pub mod html_state;
pub mod routes;
pub mod session_index;

use axum::{extract::FromRef, Router};
use axum_session::{Session, SessionLayer, SessionNullPool, SessionStore};
use html_state::HtmlState;
use tower_http::compression::CompressionLayer;

pub type SessionType = Session<SessionNullPool>;
pub type SessionStoreType = SessionStore<SessionNullPool>;

#[macro_export]
macro_rules! create_asset_service {
    // Takes the relative path to the asset directory
    ($relative_path:expr) => {{
        #[cfg(debug_assertions)]
        {
            let crate_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            let assets_path = crate_dir.join($relative_path);
            tracing::debug!("Assets: Serving from filesystem: {:?}", assets_path);
            tower_http::services::ServeDir::new(assets_path)
        }
        #[cfg(not(debug_assertions))]
        {
            tracing::debug!("Assets: Serving embedded directory");
            static ASSETS_DIR: include_dir::Dir<'static> =
                include_dir::include_dir!("$CARGO_MANIFEST_DIR/assets");
            tower_serve_static::ServeDir::new(&ASSETS_DIR)
        }
    }};
}

/// Html routes
///
/// The session layer wraps every page and fragment route; assets are nested
/// outside it so static files never touch session state.
pub fn html_routes<S>(app_state: &HtmlState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .merge(routes::index::router())
        .merge(routes::documents::router(
            app_state.config.ingest_max_body_bytes,
        ))
        .merge(routes::lookup::router())
        .merge(routes::query::router())
        .merge(routes::health::router())
        .layer(SessionLayer::new((*app_state.session_store).clone()))
        .nest_service("/assets", create_asset_service!("assets/"))
        .layer(CompressionLayer::new())
}
