use paperclip::actix::Apiv2Schema;
use paperclip::v2::schema::Apiv2Schema as Apiv2SchemaTrait;
use serde::{Deserialize, Serialize};

pub type LivroId = i32;

fn default_disponivel() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Fields of a book without its id, as stored in the catalog
pub struct LivroDetails {
    pub titulo: String,
    pub autor: String,
    pub isbn: String,
    pub ano_publicacao: i32,
    /// Defaults to true when omitted
    #[serde(default = "default_disponivel")]
    pub disponivel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Book stored in the catalog together with its id
pub struct Livro {
    pub id: LivroId,
    pub titulo: String,
    pub autor: String,
    pub isbn: String,
    pub ano_publicacao: i32,
    pub disponivel: bool,
}

impl Livro {
    pub fn from_details(id: LivroId, details: LivroDetails) -> Self {
        Self {
            id,
            titulo: details.titulo,
            autor: details.autor,
            isbn: details.isbn,
            ano_publicacao: details.ano_publicacao,
            disponivel: details.disponivel,
        }
    }

    pub fn details(&self) -> LivroDetails {
        LivroDetails {
            titulo: self.titulo.clone(),
            autor: self.autor.clone(),
            isbn: self.isbn.clone(),
            ano_publicacao: self.ano_publicacao,
            disponivel: self.disponivel,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Patch to book details. Only the fields that are set get applied to the stored book
pub struct LivroPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ano_publicacao: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disponivel: Option<bool>,
}

impl From<LivroDetails> for LivroPatch {
    fn from(details: LivroDetails) -> Self {
        Self {
            titulo: Some(details.titulo),
            autor: Some(details.autor),
            isbn: Some(details.isbn),
            ano_publicacao: Some(details.ano_publicacao),
            disponivel: Some(details.disponivel),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
/// Request body exactly as it was received. Field presence and types are checked by the service,
/// so that the error can name the offending field.
pub struct LivroPayload(pub serde_json::Map<String, serde_json::Value>);

impl Apiv2SchemaTrait for LivroPayload {}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Apiv2Schema)]
pub struct ListLivrosQuery {
    /// Case insensitive search over titulo, autor and isbn
    pub busca: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of every error response
pub struct ErrorResponse {
    pub error: String,
}
