use anyhow::Context;
use reqwest::{Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use crate::api::{ErrorResponse, Livro, LivroDetails, LivroId, LivroPatch};

#[derive(Debug, thiserror::Error)]
pub enum CatalogClientError {
    #[error("Rejected payload: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected status {status}: {message}")]
    Unexpected { status: StatusCode, message: String },

    #[error("Request failed {0}")]
    Request(#[from] reqwest_middleware::Error),

    #[error("Failed to read response {0}")]
    Response(#[from] reqwest::Error),
}

pub struct LivrariaCatalogClient {
    url: String,
    client: ClientWithMiddleware,
}

async fn error_message(response: Response) -> String {
    response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_default()
}

/// Maps every non success status to an error.
/// Calls on a single livro check NOT_FOUND themselves and answer None/false instead.
async fn into_error(response: Response) -> CatalogClientError {
    let status = response.status();
    let message = error_message(response).await;
    match status {
        StatusCode::BAD_REQUEST => CatalogClientError::BadRequest(message),
        StatusCode::CONFLICT => CatalogClientError::Conflict(message),
        StatusCode::NOT_FOUND => CatalogClientError::NotFound(message),
        status => CatalogClientError::Unexpected { status, message },
    }
}

impl LivrariaCatalogClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    fn livros_url(&self) -> String {
        format!("{}/api/livros", self.url)
    }

    fn livro_url(&self, livro_id: LivroId) -> String {
        format!("{}/api/livros/{}", self.url, livro_id)
    }

    /// Calls POST /api/livros endpoint
    /// Returns the stored livro with its id
    pub async fn create_livro(&self, details: &LivroDetails) -> Result<Livro, CatalogClientError> {
        let response = self.client.post(self.livros_url()).json(details).send().await?;
        if response.status() == StatusCode::CREATED {
            Ok(response.json().await?)
        } else {
            Err(into_error(response).await)
        }
    }

    /// Calls GET /api/livros endpoint, optionally with the busca filter
    pub async fn list_livros(&self, busca: Option<&str>) -> Result<Vec<Livro>, CatalogClientError> {
        let mut request = self.client.get(self.livros_url());
        if let Some(busca) = busca {
            request = request.query(&[("busca", busca)]);
        }
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(into_error(response).await)
        }
    }

    /// Calls GET /api/livros/{livro_id} endpoint
    /// None if livro was not in the catalog
    pub async fn get_livro(&self, livro_id: LivroId) -> Result<Option<Livro>, CatalogClientError> {
        let response = self.client.get(self.livro_url(livro_id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            Err(into_error(response).await)
        }
    }

    /// Calls PUT /api/livros/{livro_id} endpoint
    /// None if livro was not in the catalog
    pub async fn replace_livro(
        &self,
        livro_id: LivroId,
        details: &LivroDetails,
    ) -> Result<Option<Livro>, CatalogClientError> {
        let response = self
            .client
            .put(self.livro_url(livro_id))
            .json(details)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            Err(into_error(response).await)
        }
    }

    /// Calls PATCH /api/livros/{livro_id} endpoint
    /// None if livro was not in the catalog
    pub async fn patch_livro(
        &self,
        livro_id: LivroId,
        patch: &LivroPatch,
    ) -> Result<Option<Livro>, CatalogClientError> {
        let response = self
            .client
            .patch(self.livro_url(livro_id))
            .json(patch)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            Err(into_error(response).await)
        }
    }

    /// Calls DELETE /api/livros/{livro_id} endpoint
    /// Returns false if there was nothing to delete
    pub async fn delete_livro(&self, livro_id: LivroId) -> Result<bool, CatalogClientError> {
        let response = self.client.delete(self.livro_url(livro_id)).send().await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(into_error(response).await),
        }
    }
}
