use thiserror::Error;

use crate::catalog::CatalogError;
use crate::model::{QuestionError, ScoreError, SessionMetaError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    SessionMeta(#[from] SessionMetaError),
    #[error(transparent)]
    Score(#[from] ScoreError),
}
