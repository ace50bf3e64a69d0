use actix_web::error::InternalError;
use actix_web::HttpResponse;
use paperclip::actix::web;

use crate::api::ErrorResponse;
use crate::handlers;

/// Json extractor config answering malformed bodies with the usual error body
pub fn json_config() -> actix_web::web::JsonConfig {
    actix_web::web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse {
            error: format!("invalid json body: {err}"),
        });
        InternalError::from_response(err, response).into()
    })
}

/// Path extractor config, an id that does not parse is answered like a missing livro
pub fn path_config() -> actix_web::web::PathConfig {
    actix_web::web::PathConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::NotFound().json(ErrorResponse {
            error: format!("livro not found: {err}"),
        });
        InternalError::from_response(err, response).into()
    })
}

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/api/livros")
                .service(
                    web::resource("")
                        .route(web::get().to(handlers::list_livros))
                        .route(web::post().to(handlers::create_livro)),
                )
                .service(
                    web::resource("/{livro_id}")
                        .route(web::get().to(handlers::get_livro))
                        .route(web::put().to(handlers::replace_livro))
                        .route(web::patch().to(handlers::patch_livro))
                        .route(web::delete().to(handlers::delete_livro)),
                ),
        );
}
