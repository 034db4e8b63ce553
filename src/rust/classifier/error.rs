/// Errors raised by a [`Model`](super::Model) while it is being fed or fitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// A training document had an empty text or an empty label
    #[error("Malformed training document: {0}")]
    MalformedDocument(String),
    /// `train` was called before any document was added
    #[error("No documents to train with")]
    NoDocuments,
    /// The fitting task panicked or was cancelled before it produced a model
    #[error("Training aborted: {0}")]
    TrainingAborted(String),
}
