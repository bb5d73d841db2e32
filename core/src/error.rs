use thiserror::Error;

use crate::DocId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A source record lacked a required field. `record` is its position in the input.
    #[error("record {record} is missing required field `{field}`")]
    MissingField { field: &'static str, record: usize },
    #[error("duplicate document id: {0}")]
    DuplicateId(DocId),
    #[error("document {0} was never registered")]
    UnknownDocument(DocId),
    #[error("document {0} was already ingested")]
    AlreadyIngested(DocId),
    /// Two rank vectors did not cover the same document ids.
    #[error("rank vectors differ in shape: {left} ids vs {right} ids")]
    DimensionMismatch { left: usize, right: usize },
}

pub type Result<T> = std::result::Result<T, IndexError>;
