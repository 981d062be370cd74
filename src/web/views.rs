use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Path;
use tower_sessions::Session;

use super::auth::is_authenticated;
use crate::error::SnapError;
use crate::styles::{Quality, StyleConfig};

#[derive(Template, WebTemplate)]
#[template(path = "catalog.html")]
pub(crate) struct CatalogTemplate {
    pub(crate) styles: &'static [StyleConfig],
    pub(crate) authenticated: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub(crate) struct LoginTemplate {
    pub(crate) csrf_token: String,
    pub(crate) redirect: String,
    pub(crate) has_flash: bool,
    pub(crate) flash_message: String,
    pub(crate) flash_class: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "generate.html")]
pub(crate) struct GenerateTemplate {
    pub(crate) style: &'static StyleConfig,
    pub(crate) qualities: &'static [&'static str],
}

/// handles the / GET
pub(crate) async fn catalog_handler(session: Session) -> Result<CatalogTemplate, SnapError> {
    Ok(CatalogTemplate {
        styles: StyleConfig::all(),
        authenticated: is_authenticated(&session).await?,
    })
}

/// Upload form for one style, behind the auth gate.
pub(crate) async fn generate_page(
    Path(style_id): Path<String>,
) -> Result<GenerateTemplate, SnapError> {
    let style = StyleConfig::get(&style_id).ok_or(SnapError::NotFound(style_id))?;
    Ok(GenerateTemplate {
        style,
        qualities: Quality::ALLOWED,
    })
}
