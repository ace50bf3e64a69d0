use actix_web::http::header::LOCATION;
use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{ErrorResponse, ListLivrosQuery, LivroId, LivroPayload};
use crate::livros_service::{LivrosService, LivrosServiceError};

fn error_response(operation: &str, err: LivrosServiceError) -> HttpResponse {
    match err {
        LivrosServiceError::Validation(message) => {
            HttpResponse::BadRequest().json(ErrorResponse { error: message })
        }
        LivrosServiceError::Conflict(message) => {
            HttpResponse::Conflict().json(ErrorResponse { error: message })
        }
        err @ LivrosServiceError::NotFound(_) => HttpResponse::NotFound().json(ErrorResponse {
            error: err.to_string(),
        }),
        LivrosServiceError::Storage(err) => {
            tracing::error!("{} failed {}", operation, err);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("{} failed", operation),
            })
        }
    }
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn list_livros(
    livros_service: Data<LivrosService>,
    query: web::Query<ListLivrosQuery>,
) -> Result<HttpResponse, Error> {
    Ok(
        match livros_service.list_livros(query.busca.as_deref()).await {
            Ok(livros) => HttpResponse::Ok().json(livros),
            Err(err) => error_response("List livros", err),
        },
    )
}

#[api_v2_operation]
pub async fn create_livro(
    livros_service: Data<LivrosService>,
    payload: web::Json<LivroPayload>,
) -> Result<HttpResponse, Error> {
    Ok(
        match livros_service.create_livro(payload.into_inner()).await {
            Ok(livro) => HttpResponse::Created()
                .append_header((LOCATION, format!("/api/livros/{}", livro.id)))
                .json(livro),
            Err(err) => error_response("Create livro", err),
        },
    )
}

#[api_v2_operation]
pub async fn get_livro(
    livros_service: Data<LivrosService>,
    livro_id: web::Path<LivroId>,
) -> Result<HttpResponse, Error> {
    Ok(match livros_service.get_livro(livro_id.into_inner()).await {
        Ok(livro) => HttpResponse::Ok().json(livro),
        Err(err) => error_response("Get livro", err),
    })
}

#[api_v2_operation]
pub async fn replace_livro(
    livros_service: Data<LivrosService>,
    livro_id: web::Path<LivroId>,
    payload: web::Json<LivroPayload>,
) -> Result<HttpResponse, Error> {
    Ok(
        match livros_service
            .replace_livro(livro_id.into_inner(), payload.into_inner())
            .await
        {
            Ok(livro) => HttpResponse::Ok().json(livro),
            Err(err) => error_response("Replace livro", err),
        },
    )
}

#[api_v2_operation]
pub async fn patch_livro(
    livros_service: Data<LivrosService>,
    livro_id: web::Path<LivroId>,
    payload: web::Json<LivroPayload>,
) -> Result<HttpResponse, Error> {
    Ok(
        match livros_service
            .patch_livro(livro_id.into_inner(), payload.into_inner())
            .await
        {
            Ok(livro) => HttpResponse::Ok().json(livro),
            Err(err) => error_response("Patch livro", err),
        },
    )
}

#[api_v2_operation]
pub async fn delete_livro(
    livros_service: Data<LivrosService>,
    livro_id: web::Path<LivroId>,
) -> Result<HttpResponse, Error> {
    Ok(
        match livros_service.delete_livro(livro_id.into_inner()).await {
            Ok(()) => HttpResponse::NoContent().finish(),
            Err(err) => error_response("Delete livro", err),
        },
    )
}
