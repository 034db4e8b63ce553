use serde::Serialize;

mod bayes;
mod error;
mod utils;

pub use bayes::BayesModel;
pub use error::ModelError;

/// A single ranked answer from [`Model::classifications`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    pub value: f64,
}

/// The trainable classifier each registry slot owns.
///
/// A model is fed every training document with [`add_document`](Model::add_document),
/// fitted once with [`train`](Model::train), and only read afterwards. The registry
/// never feeds an already published model: every retrain starts from a fresh
/// instance produced by its factory.
pub trait Model: Send + Sync + 'static {
    /// Queues one `(text, label)` pair for the next `train` call
    fn add_document(&mut self, text: &str, label: &str) -> Result<(), ModelError>;

    /// Fits the model to every queued document
    fn train(&mut self) -> Result<(), ModelError>;

    /// Every label `text` was scored against, best first.
    ///
    /// An untrained model returns an empty list.
    fn classifications(&self, text: &str) -> Vec<Classification>;

    /// Labels the model knows about, sorted
    fn labels(&self) -> Vec<String>;

    /// The single best label, or `None` for an untrained model
    fn classify(&self, text: &str) -> Option<String> {
        self.classifications(text)
            .into_iter()
            .next()
            .map(|classification| classification.label)
    }
}

/// Information about the current state of a registered classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierInfo {
    /// Name the classifier is registered under
    pub name: String,
    /// Number of documents the live model was fitted on (0 when untrained)
    pub trained_document_count: usize,
    /// Labels of the live model
    pub labels: Vec<String>,
}
