use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use serde_json::json;

use crate::api::{Livro, LivroDetails, LivroId, LivroPatch};
use crate::livros_repository::{LivrosRepository, LivrosRepositoryError};

pub struct InMemoryLivrosRepository {
    livro_sequence_generator: AtomicI32,
    livros: parking_lot::RwLock<BTreeMap<LivroId, LivroDetails>>,
}

impl Default for InMemoryLivrosRepository {
    fn default() -> Self {
        Self {
            livro_sequence_generator: AtomicI32::new(1),
            livros: Default::default(),
        }
    }
}

fn isbn_taken_by_other(
    livros: &BTreeMap<LivroId, LivroDetails>,
    isbn: &str,
    livro_id: Option<LivroId>,
) -> bool {
    livros
        .iter()
        .any(|(&id, details)| details.isbn == isbn && Some(id) != livro_id)
}

#[async_trait::async_trait]
impl LivrosRepository for InMemoryLivrosRepository {
    async fn add_livro(&self, details: LivroDetails) -> Result<Livro, LivrosRepositoryError> {
        let mut locked_livros = self.livros.write();
        if isbn_taken_by_other(&locked_livros, &details.isbn, None) {
            return Err(LivrosRepositoryError::DuplicateIsbn(details.isbn));
        }
        let id = self.livro_sequence_generator.fetch_add(1, Ordering::Relaxed);
        locked_livros.insert(id, details.clone());
        Ok(Livro::from_details(id, details))
    }

    async fn update_livro(
        &self,
        livro_id: LivroId,
        patch: LivroPatch,
    ) -> Result<Option<Livro>, LivrosRepositoryError> {
        let mut locked_livros = self.livros.write();
        if let Some(isbn) = &patch.isbn {
            if isbn_taken_by_other(&locked_livros, isbn, Some(livro_id)) {
                return Err(LivrosRepositoryError::DuplicateIsbn(isbn.clone()));
            }
        }
        if let Some(livro) = locked_livros.get_mut(&livro_id) {
            let mut result_livro = json!(livro);
            json_patch::merge(&mut result_livro, &json!(patch));
            let result_livro: LivroDetails = serde_json::from_value(result_livro)?;
            *livro = result_livro.clone();
            Ok(Some(Livro::from_details(livro_id, result_livro)))
        } else {
            Ok(None)
        }
    }

    async fn get_livro(&self, livro_id: LivroId) -> Result<Option<Livro>, LivrosRepositoryError> {
        Ok(self
            .livros
            .read()
            .get(&livro_id)
            .cloned()
            .map(|details| Livro::from_details(livro_id, details)))
    }

    async fn list_livros(&self) -> Result<Vec<Livro>, LivrosRepositoryError> {
        Ok(self
            .livros
            .read()
            .iter()
            .map(|(&livro_id, details)| Livro::from_details(livro_id, details.clone()))
            .collect())
    }

    async fn delete_livro(&self, livro_id: LivroId) -> Result<bool, LivrosRepositoryError> {
        Ok(self.livros.write().remove(&livro_id).is_some())
    }
}
