use anyhow::Context;
use serde_json::json;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row, Statement};

use crate::api::{Livro, LivroDetails, LivroId, LivroPatch};
use crate::livros_repository::{LivrosRepository, LivrosRepositoryError};

pub struct PostgresLivrosRepository {
    client: Client,
}

pub struct PostgresLivrosRepositoryConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl PostgresLivrosRepository {
    pub async fn init(config: PostgresLivrosRepositoryConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}",
            config.username, config.password, config.hostname
        );
        tracing::info!("Connecting to postgres at {}", config.hostname);
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Postgres connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS livros (
            id              SERIAL PRIMARY KEY,
            params          JSONB NOT NULL
            );
        CREATE UNIQUE INDEX IF NOT EXISTS livros_isbn_key ON livros ((params->>'isbn'));
        ",
            )
            .await
            .context("Failed to setup livros table")?;
        Ok(Self { client })
    }
}

fn livro_from_row(row: &Row) -> Result<Livro, LivrosRepositoryError> {
    let livro_id: LivroId = row.try_get(0)?;
    let details: serde_json::Value = row.try_get(1)?;
    let details: LivroDetails = serde_json::from_value(details)?;
    Ok(Livro::from_details(livro_id, details))
}

/// Turns a unique index violation into DuplicateIsbn, passes other errors through
fn map_unique_violation(err: tokio_postgres::Error, isbn: &str) -> LivrosRepositoryError {
    let is_unique_violation = err
        .as_db_error()
        .map(|db_err| db_err.code() == &SqlState::UNIQUE_VIOLATION)
        .unwrap_or_default();
    if is_unique_violation {
        LivrosRepositoryError::DuplicateIsbn(isbn.to_string())
    } else {
        err.into()
    }
}

#[async_trait::async_trait]
impl LivrosRepository for PostgresLivrosRepository {
    async fn add_livro(&self, details: LivroDetails) -> Result<Livro, LivrosRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO livros (params) VALUES ($1) RETURNING id, params")
            .await?;

        let rows = self
            .client
            .query(&stmt, &[&json!(details)])
            .await
            .map_err(|err| map_unique_violation(err, &details.isbn))?;

        let row = rows
            .first()
            .ok_or_else(|| LivrosRepositoryError::Other("Id not returned".to_string()))?;
        livro_from_row(row)
    }

    async fn update_livro(
        &self,
        livro_id: LivroId,
        patch: LivroPatch,
    ) -> Result<Option<Livro>, LivrosRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE livros SET params = params || ($1)::JSONB WHERE id = ($2) RETURNING id, params",
            )
            .await?;

        let rows = self
            .client
            .query(&stmt, &[&json!(patch), &livro_id])
            .await
            .map_err(|err| map_unique_violation(err, patch.isbn.as_deref().unwrap_or_default()))?;

        rows.first().map(livro_from_row).transpose()
    }

    async fn get_livro(&self, livro_id: LivroId) -> Result<Option<Livro>, LivrosRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, params FROM livros WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&livro_id]).await?;

        rows.first().map(livro_from_row).transpose()
    }

    async fn list_livros(&self) -> Result<Vec<Livro>, LivrosRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, params FROM livros ORDER BY id")
            .await?;

        let rows = self.client.query(&stmt, &[]).await?;

        rows.iter().map(livro_from_row).collect()
    }

    async fn delete_livro(&self, livro_id: LivroId) -> Result<bool, LivrosRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM livros WHERE id = ($1) RETURNING id")
            .await?;

        let rows = self.client.query(&stmt, &[&livro_id]).await?;
        Ok(!rows.is_empty())
    }
}

#[cfg(test)]
mod postgres_livros_repository_tests {
    use serial_test::file_serial;
    use testcontainers::core::IntoContainerPort;
    use testcontainers::runners::AsyncRunner;
    use testcontainers::{ContainerAsync, GenericImage, ImageExt};

    use crate::api::{Livro, LivroDetails, LivroPatch};
    use crate::livros_repository::{
        LivrosRepository, LivrosRepositoryError, PostgresLivrosRepository,
        PostgresLivrosRepositoryConfig,
    };

    async fn start_postgres_container_and_init_repo(
    ) -> (ContainerAsync<GenericImage>, PostgresLivrosRepository) {
        let _pg_container = GenericImage::new("postgres", "latest")
            .with_mapped_port(5432, 5432.tcp())
            .with_env_var("POSTGRES_USER", "postgres")
            .with_env_var("POSTGRES_PASSWORD", "postgres")
            .start()
            .await
            .expect("Failed to start postgres");

        for _ in 0..10 {
            if let Ok(repo) = PostgresLivrosRepository::init(PostgresLivrosRepositoryConfig {
                hostname: "127.0.0.1".to_string(),
                username: "postgres".to_string(),
                password: "postgres".to_string(),
            })
            .await
            {
                return (_pg_container, repo);
            }
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }
        panic!("Failed to setup postgres container")
    }

    fn dom_casmurro() -> LivroDetails {
        LivroDetails {
            titulo: "Dom Casmurro".to_string(),
            autor: "Machado de Assis".to_string(),
            isbn: "111".to_string(),
            ano_publicacao: 1899,
            disponivel: true,
        }
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Covers add, get, list and delete
    /// for the sake of not starting container multiple times it tests everything in one testcase
    async fn test_livro_lifecycle() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        assert_eq!(repo.get_livro(20000).await.unwrap(), None);
        assert_eq!(repo.list_livros().await.unwrap(), vec![]);

        let first = repo
            .add_livro(dom_casmurro())
            .await
            .expect("Failed to add livro");
        assert_eq!(first.details(), dom_casmurro());

        let second = repo
            .add_livro(LivroDetails {
                titulo: "O Cortiço".to_string(),
                autor: "Aluísio Azevedo".to_string(),
                isbn: "222".to_string(),
                ..dom_casmurro()
            })
            .await
            .expect("Failed to add livro");

        assert_eq!(repo.get_livro(first.id).await.unwrap(), Some(first.clone()));
        assert_eq!(
            repo.list_livros().await.unwrap(),
            vec![first.clone(), second.clone()]
        );

        assert!(repo.delete_livro(first.id).await.unwrap());
        assert!(!repo.delete_livro(first.id).await.unwrap());
        assert_eq!(repo.list_livros().await.unwrap(), vec![second]);
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Covers patch merging and the unique isbn index
    async fn test_patch_and_unique_isbn() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        let not_found = repo
            .update_livro(2000, LivroPatch::default())
            .await
            .expect("Failed to update");
        assert_eq!(not_found, None);

        let first = repo.add_livro(dom_casmurro()).await.unwrap();
        let second = repo
            .add_livro(LivroDetails {
                isbn: "222".to_string(),
                ..dom_casmurro()
            })
            .await
            .unwrap();

        let patched = repo
            .update_livro(
                first.id,
                LivroPatch {
                    disponivel: Some(false),
                    ..LivroPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            patched,
            Some(Livro {
                disponivel: false,
                ..first.clone()
            })
        );

        let duplicate = repo.add_livro(dom_casmurro()).await;
        assert!(matches!(
            duplicate,
            Err(LivrosRepositoryError::DuplicateIsbn(..))
        ));

        let steal_isbn = repo
            .update_livro(
                second.id,
                LivroPatch {
                    isbn: Some("111".to_string()),
                    ..LivroPatch::default()
                },
            )
            .await;
        assert!(matches!(
            steal_isbn,
            Err(LivrosRepositoryError::DuplicateIsbn(..))
        ));
    }
}
