use actix_web::{HttpRequest, HttpResponse, Responder, http::header, web};

use crate::{
    config::ConfServeConfig,
    errors::{RuntimeError, json_error_handler},
    file_op, renderer,
};

/// Registers the page, the API routes and their shared state
pub fn configure_app(app: &mut web::ServiceConfig, conf: &ConfServeConfig) {
    app.app_data(web::Data::new(conf.clone()))
        .app_data(web::Data::new(conf.store()))
        .app_data(
            web::JsonConfig::default()
                .limit(conf.security.max_request_size)
                .error_handler(json_error_handler),
        )
        .route("/", web::get().to(index_page))
        .route(&conf.healthcheck_route, web::get().to(healthcheck))
        .route("/list-configs", web::get().to(file_op::list_configs))
        .route("/get-config/{name}", web::get().to(file_op::get_config))
        .route(
            "/download-config/{name}",
            web::get().to(file_op::download_config),
        )
        .route("/create-config", web::post().to(file_op::create_config))
        .route(
            "/delete-config/{name}",
            web::delete().to(file_op::delete_config),
        )
        .default_service(web::to(route_not_found));
}

async fn index_page(conf: web::Data<ConfServeConfig>) -> impl Responder {
    HttpResponse::Ok()
        .content_type(mime::TEXT_HTML_UTF_8)
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .body(renderer::page(&conf.title).into_string())
}

async fn healthcheck() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

async fn route_not_found(req: HttpRequest) -> Result<HttpResponse, RuntimeError> {
    Err(RuntimeError::RouteNotFound(req.path().to_string()))
}
