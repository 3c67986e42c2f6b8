//! Handlers for the five configuration file operations

use std::io;

use actix_files::NamedFile;
use actix_web::{
    HttpRequest, HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use serde::{Deserialize, Serialize};

use crate::{errors::RuntimeError, store::ConfigStore};

/// Body of `POST /create-config`; both fields are checked by hand so that a
/// missing one yields the regular error body
#[derive(Debug, Deserialize)]
pub struct CreateConfigRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigList {
    pub configs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigContent {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Runs a store operation on the blocking thread pool
async fn blocking<F, R>(f: F) -> Result<R, RuntimeError>
where
    F: FnOnce() -> Result<R, RuntimeError> + Send + 'static,
    R: Send + 'static,
{
    web::block(f).await.map_err(|e| {
        RuntimeError::io(
            "Error handling request",
            "<blocking pool>",
            io::Error::other(e.to_string()),
        )
    })?
}

/// `GET /list-configs`
pub async fn list_configs(store: web::Data<ConfigStore>) -> Result<HttpResponse, RuntimeError> {
    let configs = blocking(move || store.list()).await?;
    Ok(HttpResponse::Ok().json(ConfigList { configs }))
}

/// `GET /get-config/{name}`
pub async fn get_config(
    store: web::Data<ConfigStore>,
    name: web::Path<String>,
) -> Result<HttpResponse, RuntimeError> {
    let name = name.into_inner();
    let bytes = blocking(move || store.read(&name)).await?;
    let content = String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
    Ok(HttpResponse::Ok().json(ConfigContent { content }))
}

/// `GET /download-config/{name}`, streams the file as an attachment
pub async fn download_config(
    req: HttpRequest,
    store: web::Data<ConfigStore>,
    name: web::Path<String>,
) -> Result<HttpResponse, RuntimeError> {
    let name = name.into_inner();
    let path = {
        let name = name.clone();
        blocking(move || store.locate(&name)).await?
    };

    let file = NamedFile::open_async(&path).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RuntimeError::NotFound(name.clone()),
        _ => RuntimeError::io("Error downloading file", path.display().to_string(), e),
    })?;

    log::debug!("Sending {} as attachment", path.display());
    Ok(file
        .set_content_type(mime::APPLICATION_OCTET_STREAM)
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(name)],
        })
        .into_response(&req))
}

/// `POST /create-config`
pub async fn create_config(
    store: web::Data<ConfigStore>,
    body: web::Json<CreateConfigRequest>,
) -> Result<HttpResponse, RuntimeError> {
    let CreateConfigRequest { name, content } = body.into_inner();
    let (name, content) = match (name, content) {
        (Some(name), Some(content)) if !name.is_empty() && !content.is_empty() => (name, content),
        _ => {
            return Err(RuntimeError::BadRequest(
                "Name and content are required".to_string(),
            ));
        }
    };

    blocking(move || store.create(&name, content.as_bytes())).await?;
    Ok(HttpResponse::Created().json(MessageResponse::new("Configuration created successfully")))
}

/// `DELETE /delete-config/{name}`
pub async fn delete_config(
    store: web::Data<ConfigStore>,
    name: web::Path<String>,
) -> Result<HttpResponse, RuntimeError> {
    let name = name.into_inner();
    blocking(move || store.delete(&name)).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Configuration deleted successfully")))
}
