use crate::api::{Livro, LivroDetails, LivroId, LivroPatch};
use crate::livros_repository::{LivrosRepository, LivrosRepositoryError};

/// Repository that looks empty but fails every other call with the given error
pub struct FailingLivrosRepository {
    failure: fn() -> LivrosRepositoryError,
}

impl FailingLivrosRepository {
    pub fn new(failure: fn() -> LivrosRepositoryError) -> Self {
        Self { failure }
    }
}

#[async_trait::async_trait]
impl LivrosRepository for FailingLivrosRepository {
    async fn add_livro(&self, _details: LivroDetails) -> Result<Livro, LivrosRepositoryError> {
        Err((self.failure)())
    }

    async fn update_livro(
        &self,
        _livro_id: LivroId,
        _patch: LivroPatch,
    ) -> Result<Option<Livro>, LivrosRepositoryError> {
        Err((self.failure)())
    }

    async fn get_livro(&self, _livro_id: LivroId) -> Result<Option<Livro>, LivrosRepositoryError> {
        Err((self.failure)())
    }

    async fn list_livros(&self) -> Result<Vec<Livro>, LivrosRepositoryError> {
        Ok(vec![])
    }

    async fn delete_livro(&self, _livro_id: LivroId) -> Result<bool, LivrosRepositoryError> {
        Err((self.failure)())
    }
}
