pub use in_memory_livros_repository::InMemoryLivrosRepository;
pub use postgres_livros_repository::{PostgresLivrosRepository, PostgresLivrosRepositoryConfig};

use crate::api::{Livro, LivroDetails, LivroId, LivroPatch};

mod in_memory_livros_repository;
mod postgres_livros_repository;

#[cfg(test)]
pub(crate) mod fake_livros_repository;

#[derive(thiserror::Error, Debug)]
pub enum LivrosRepositoryError {
    #[error("Isbn {0} already registered")]
    DuplicateIsbn(String),

    #[error("Failed to deserialize livro: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait LivrosRepository: Send + Sync {
    /// Adds livro to repository, returns it together with the assigned id
    async fn add_livro(&self, details: LivroDetails) -> Result<Livro, LivrosRepositoryError>;
    /// Merges the patch into the stored livro, returns None if it was not found
    async fn update_livro(
        &self,
        livro_id: LivroId,
        patch: LivroPatch,
    ) -> Result<Option<Livro>, LivrosRepositoryError>;
    /// Retrieves the livro, None if it was not found
    async fn get_livro(&self, livro_id: LivroId) -> Result<Option<Livro>, LivrosRepositoryError>;
    /// Lists all livros in the repository ordered by id
    async fn list_livros(&self) -> Result<Vec<Livro>, LivrosRepositoryError>;
    /// Removes the livro, returns true if it was there
    async fn delete_livro(&self, livro_id: LivroId) -> Result<bool, LivrosRepositoryError>;
}
