use std::sync::Arc;

use serde_json::{Map, Value};

use crate::api::{Livro, LivroDetails, LivroId, LivroPatch, LivroPayload};
use crate::livros_repository::{LivrosRepository, LivrosRepositoryError};

const ISBN_ALREADY_REGISTERED: &str = "isbn already registered";
const ISBN_REGISTERED_ON_ANOTHER_LIVRO: &str = "isbn already registered on another book";

#[derive(thiserror::Error, Debug)]
pub enum LivrosServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Livro {0} not found")]
    NotFound(LivroId),

    #[error("Storage failure: {0}")]
    Storage(#[from] LivrosRepositoryError),
}

/// Catalog operations on top of a livros repository.
/// Validates payloads and keeps isbn unique before anything is written.
#[derive(Clone)]
pub struct LivrosService {
    repository: Arc<dyn LivrosRepository>,
}

fn required_string(payload: &Map<String, Value>, field: &str) -> Result<String, LivrosServiceError> {
    match payload.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        _ => Err(LivrosServiceError::Validation(format!(
            "field '{field}' is required and must be a non-empty string"
        ))),
    }
}

/// Whole numbers only, `2020.0` included
fn integer(value: &Value) -> Option<i32> {
    match value.as_i64() {
        Some(number) => i32::try_from(number).ok(),
        None => value
            .as_f64()
            .filter(|number| {
                number.fract() == 0.0
                    && *number >= f64::from(i32::MIN)
                    && *number <= f64::from(i32::MAX)
            })
            .map(|number| number as i32),
    }
}

/// Checks a full payload, used on create and full update
pub fn validate_livro_payload(payload: &LivroPayload) -> Result<LivroDetails, LivrosServiceError> {
    let payload = &payload.0;
    let titulo = required_string(payload, "titulo")?;
    let autor = required_string(payload, "autor")?;
    let isbn = required_string(payload, "isbn")?;
    let ano_publicacao = payload.get("anoPublicacao").and_then(integer).ok_or_else(|| {
        LivrosServiceError::Validation(
            "field 'anoPublicacao' is required and must be an integer".to_string(),
        )
    })?;

    Ok(LivroDetails {
        titulo,
        autor,
        isbn,
        ano_publicacao,
        disponivel: optional_bool(payload, "disponivel")?.unwrap_or(true),
    })
}

fn optional_bool(payload: &Map<String, Value>, field: &str) -> Result<Option<bool>, LivrosServiceError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(LivrosServiceError::Validation(format!(
            "field '{field}' must be a boolean when provided"
        ))),
    }
}

/// Checks a partial payload, only the fields that are present need to be well typed
pub fn parse_livro_patch(payload: &LivroPayload) -> Result<LivroPatch, LivrosServiceError> {
    let payload = &payload.0;
    let optional_string = |field: &str| match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => required_string(payload, field).map(Some),
    };

    let ano_publicacao = match payload.get("anoPublicacao") {
        None | Some(Value::Null) => None,
        Some(value) => Some(integer(value).ok_or_else(|| {
            LivrosServiceError::Validation("field 'anoPublicacao' must be an integer".to_string())
        })?),
    };

    Ok(LivroPatch {
        titulo: optional_string("titulo")?,
        autor: optional_string("autor")?,
        isbn: optional_string("isbn")?,
        ano_publicacao,
        disponivel: optional_bool(payload, "disponivel")?,
    })
}

fn matches_busca(livro: &Livro, busca_lower: &str) -> bool {
    [&livro.titulo, &livro.autor, &livro.isbn]
        .iter()
        .any(|field| field.to_lowercase().contains(busca_lower))
}

fn storage_to_service_error(err: LivrosRepositoryError, conflict_message: &str) -> LivrosServiceError {
    match err {
        LivrosRepositoryError::DuplicateIsbn(_) => {
            LivrosServiceError::Conflict(conflict_message.to_string())
        }
        other => other.into(),
    }
}

impl LivrosService {
    pub fn new(repository: Arc<dyn LivrosRepository>) -> Self {
        Self { repository }
    }

    async fn ensure_isbn_free(
        &self,
        isbn: &str,
        livro_id: Option<LivroId>,
        conflict_message: &str,
    ) -> Result<(), LivrosServiceError> {
        let existing = self.repository.list_livros().await?;
        if existing
            .iter()
            .any(|livro| livro.isbn == isbn && Some(livro.id) != livro_id)
        {
            return Err(LivrosServiceError::Conflict(conflict_message.to_string()));
        }
        Ok(())
    }

    pub async fn create_livro(&self, payload: LivroPayload) -> Result<Livro, LivrosServiceError> {
        let details = validate_livro_payload(&payload)?;

        self.ensure_isbn_free(&details.isbn, None, ISBN_ALREADY_REGISTERED)
            .await?;

        self.repository
            .add_livro(details)
            .await
            .map_err(|err| storage_to_service_error(err, ISBN_ALREADY_REGISTERED))
    }

    /// Lists all livros, or only those matching `busca` on titulo, autor or isbn
    pub async fn list_livros(&self, busca: Option<&str>) -> Result<Vec<Livro>, LivrosServiceError> {
        let livros = self.repository.list_livros().await?;
        Ok(match busca.filter(|busca| !busca.is_empty()) {
            Some(busca) => {
                let busca_lower = busca.to_lowercase();
                livros
                    .into_iter()
                    .filter(|livro| matches_busca(livro, &busca_lower))
                    .collect()
            }
            None => livros,
        })
    }

    pub async fn get_livro(&self, livro_id: LivroId) -> Result<Livro, LivrosServiceError> {
        self.repository
            .get_livro(livro_id)
            .await?
            .ok_or(LivrosServiceError::NotFound(livro_id))
    }

    /// Full update, every required field has to be present.
    /// When disponivel is omitted the stored value stays.
    pub async fn replace_livro(
        &self,
        livro_id: LivroId,
        payload: LivroPayload,
    ) -> Result<Livro, LivrosServiceError> {
        let mut patch = LivroPatch::from(validate_livro_payload(&payload)?);
        if payload.0.get("disponivel").map_or(true, Value::is_null) {
            patch.disponivel = None;
        }
        self.apply_patch(livro_id, patch).await
    }

    pub async fn patch_livro(
        &self,
        livro_id: LivroId,
        payload: LivroPayload,
    ) -> Result<Livro, LivrosServiceError> {
        let patch = parse_livro_patch(&payload)?;
        self.apply_patch(livro_id, patch).await
    }

    async fn apply_patch(
        &self,
        livro_id: LivroId,
        patch: LivroPatch,
    ) -> Result<Livro, LivrosServiceError> {
        if let Some(isbn) = &patch.isbn {
            self.ensure_isbn_free(isbn, Some(livro_id), ISBN_REGISTERED_ON_ANOTHER_LIVRO)
                .await?;
        }

        self.repository
            .update_livro(livro_id, patch)
            .await
            .map_err(|err| storage_to_service_error(err, ISBN_REGISTERED_ON_ANOTHER_LIVRO))?
            .ok_or(LivrosServiceError::NotFound(livro_id))
    }

    pub async fn delete_livro(&self, livro_id: LivroId) -> Result<(), LivrosServiceError> {
        if self.repository.delete_livro(livro_id).await? {
            Ok(())
        } else {
            Err(LivrosServiceError::NotFound(livro_id))
        }
    }
}
