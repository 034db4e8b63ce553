use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::classifier::{BayesModel, Classification, ClassifierInfo, Model, ModelError};
use crate::config::RegistryConfig;
use crate::locks::{LockError, NameGuard, NameLocks};

#[derive(Debug, thiserror::Error)]
pub enum KinderError {
    #[error("Classifier '{0}' already exists")]
    AlreadyExists(String),
    #[error("Classifier '{0}' does not exist")]
    NotFound(String),
    #[error("Unknown classifier '{0}'")]
    UnknownClassifier(String),
    #[error("No documents to train classifier '{0}' with")]
    EmptyTrainingSet(String),
    #[error("Training set not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to parse training set {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to read training set {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Classifier name cannot be empty")]
    InvalidName,
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Lock acquisition failed: {0}")]
    LockAcquisition(#[from] LockError),
}

impl KinderError {
    /// True when the operation failed because its lock could not be taken
    /// rather than because of how it was called. Such operations were not
    /// performed and may be retried.
    pub fn is_lock_failure(&self) -> bool {
        matches!(self, Self::LockAcquisition(_))
    }
}

/// One `(text, label)` pair of a training set.
///
/// Training sets on disk are JSON arrays of these objects:
/// `[{"text": "I like apples", "classification": "fruit"}]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingDocument {
    pub text: String,
    pub classification: String,
}

impl TrainingDocument {
    pub fn new(text: impl Into<String>, classification: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            classification: classification.into(),
        }
    }
}

/// Reads a JSON training set from `path`.
pub async fn load_training_set(path: impl AsRef<Path>) -> Result<Vec<TrainingDocument>, KinderError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => KinderError::FileNotFound(path.to_path_buf()),
        _ => KinderError::Io { path: path.to_path_buf(), source: e },
    })?;
    let documents: Vec<TrainingDocument> = serde_json::from_str(&raw)
        .map_err(|source| KinderError::JsonParse { path: path.to_path_buf(), source })?;
    debug!("Loaded {} training documents from {:?}", documents.len(), path);
    Ok(documents)
}

/// A registered classifier: the live model and how many documents fitted it.
#[derive(Debug)]
struct ClassifierEntry<M> {
    model: Arc<M>,
    trained_document_count: usize,
}

impl<M> Clone for ClassifierEntry<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            trained_document_count: self.trained_document_count,
        }
    }
}

type Factory<M> = Arc<dyn Fn() -> M + Send + Sync>;

/// A set of independently trained classifiers addressed by name.
///
/// Every operation takes the lock for the name it addresses, so operations on
/// one classifier never interleave while operations on different classifiers
/// run concurrently. Models are never modified once published: `train` fits a
/// fresh model from the factory and swaps it in as its last step, so readers
/// see either the previous model or the new one.
///
/// ```rust
/// # #[tokio::main]
/// # async fn main() -> Result<(), kinder::KinderError> {
/// use kinder::{ClassifierRegistry, TrainingDocument};
///
/// let registry = ClassifierRegistry::new();
/// registry.create_classifier("fruit").await?;
/// registry.train(vec![
///     TrainingDocument::new("I like apples", "fruit"),
///     TrainingDocument::new("I like cars", "vehicle"),
/// ], "fruit").await?;
///
/// let label = registry.classify("I love apples", "fruit").await?;
/// assert_eq!(label.as_deref(), Some("fruit"));
/// # Ok(())
/// # }
/// ```
pub struct ClassifierRegistry<M: Model = BayesModel> {
    entries: RwLock<HashMap<String, ClassifierEntry<M>>>,
    locks: NameLocks,
    factory: Factory<M>,
}

impl<M: Model> fmt::Debug for ClassifierRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierRegistry")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl ClassifierRegistry<BayesModel> {
    /// Creates an empty registry of [`BayesModel`] classifiers
    pub fn new() -> Self {
        Self::with_factory(BayesModel::default)
    }
}

impl Default for ClassifierRegistry<BayesModel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> ClassifierRegistry<M> {
    /// Creates an empty registry whose classifiers are built by `factory`.
    /// The factory is called once per `create_classifier` and once per `train`.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self {
            entries: RwLock::new(HashMap::new()),
            locks: NameLocks::default(),
            factory: Arc::new(factory),
        }
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.locks = NameLocks::new(config.lock_timeout);
        self
    }

    /// Registers a new, untrained classifier under `name`.
    ///
    /// An existing classifier with the same name is left untouched and
    /// `AlreadyExists` is returned.
    pub async fn create_classifier(&self, name: &str) -> Result<(), KinderError> {
        let result = self.create_locked(name).await;
        report("create_classifier", name, result)
    }

    async fn create_locked(&self, name: &str) -> Result<(), KinderError> {
        let _guard = self.lock(name).await?;
        if self.entries.read().await.contains_key(name) {
            return Err(KinderError::AlreadyExists(name.to_string()));
        }
        // Built outside the table lock; the name lock keeps the check above valid.
        let model = Arc::new((self.factory)());
        self.entries.write().await.insert(name.to_string(), ClassifierEntry {
            model,
            trained_document_count: 0,
        });
        info!("Created classifier '{}'", name);
        Ok(())
    }

    /// Removes the classifier registered under `name` and releases its model.
    pub async fn delete_classifier(&self, name: &str) -> Result<(), KinderError> {
        let result = self.delete_locked(name).await;
        report("delete_classifier", name, result)
    }

    async fn delete_locked(&self, name: &str) -> Result<(), KinderError> {
        let _guard = self.lock(name).await?;
        match self.entries.write().await.remove(name) {
            Some(_) => {
                info!("Deleted classifier '{}'", name);
                Ok(())
            }
            None => Err(KinderError::NotFound(name.to_string())),
        }
    }

    /// Replaces the model of `name` with one fitted from scratch on `documents`.
    ///
    /// Training is never incremental: the previous model and everything it was
    /// trained on are discarded. If any document is rejected or fitting fails,
    /// the previous model stays in place.
    pub async fn train(&self, documents: Vec<TrainingDocument>, name: &str) -> Result<(), KinderError> {
        let result = self.train_locked(documents, name).await;
        report("train", name, result)
    }

    async fn train_locked(&self, documents: Vec<TrainingDocument>, name: &str) -> Result<(), KinderError> {
        validate_name(name)?;
        if documents.is_empty() {
            return Err(KinderError::EmptyTrainingSet(name.to_string()));
        }

        let _guard = self.lock(name).await?;
        if !self.entries.read().await.contains_key(name) {
            return Err(KinderError::UnknownClassifier(name.to_string()));
        }

        let document_count = documents.len();
        let factory = Arc::clone(&self.factory);
        let model = tokio::task::spawn_blocking(move || fit(factory.as_ref(), &documents))
            .await
            .map_err(|e| ModelError::TrainingAborted(e.to_string()))??;

        // The name lock is still held, so no delete can have removed the entry.
        if let Some(entry) = self.entries.write().await.get_mut(name) {
            entry.model = Arc::new(model);
            entry.trained_document_count = document_count;
        }
        info!("Trained classifier '{}' on {} documents", name, document_count);
        Ok(())
    }

    /// Loads a JSON training set from `path` and trains `name` with it.
    ///
    /// The file is read before any lock is taken; a missing or malformed file
    /// leaves the registry untouched.
    pub async fn train_from_json(&self, path: impl AsRef<Path>, name: &str) -> Result<(), KinderError> {
        let documents = report("train_from_json", name, load_training_set(path).await)?;
        self.train(documents, name).await
    }

    /// Returns the best label for `text`, or `None` if `name` has not been
    /// trained yet.
    pub async fn classify(&self, text: &str, name: &str) -> Result<Option<String>, KinderError> {
        let result = self.read_locked(name, |model| model.classify(text)).await;
        report("classify", name, result)
    }

    /// Returns every label `text` was scored against, best first. An untrained
    /// classifier returns an empty list.
    pub async fn classify_details(&self, text: &str, name: &str) -> Result<Vec<Classification>, KinderError> {
        let result = self.read_locked(name, |model| model.classifications(text)).await;
        report("classify_details", name, result)
    }

    /// Describes the classifier registered under `name`
    pub async fn info(&self, name: &str) -> Result<ClassifierInfo, KinderError> {
        let result = self.info_locked(name).await;
        report("info", name, result)
    }

    async fn info_locked(&self, name: &str) -> Result<ClassifierInfo, KinderError> {
        let _guard = self.lock(name).await?;
        let entry = self.entry(name).await?;
        Ok(ClassifierInfo {
            name: name.to_string(),
            trained_document_count: entry.trained_document_count,
            labels: entry.model.labels(),
        })
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }

    /// Names of every registered classifier, sorted
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn read_locked<T, F>(&self, name: &str, read: F) -> Result<T, KinderError>
    where
        F: FnOnce(&M) -> T,
    {
        let _guard = self.lock(name).await?;
        let entry = self.entry(name).await?;
        Ok(read(entry.model.as_ref()))
    }

    async fn entry(&self, name: &str) -> Result<ClassifierEntry<M>, KinderError> {
        self.entries
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| KinderError::UnknownClassifier(name.to_string()))
    }

    async fn lock(&self, name: &str) -> Result<NameGuard, KinderError> {
        validate_name(name)?;
        Ok(self.locks.acquire(name).await?)
    }
}

fn validate_name(name: &str) -> Result<(), KinderError> {
    if name.is_empty() {
        return Err(KinderError::InvalidName);
    }
    Ok(())
}

/// Builds a fresh model from the factory and fits it on `documents`
fn fit<M: Model>(factory: &(dyn Fn() -> M + Send + Sync), documents: &[TrainingDocument]) -> Result<M, ModelError> {
    let mut model = factory();
    for (i, document) in documents.iter().enumerate() {
        model.add_document(&document.text, &document.classification)
            .map_err(|e| {
                debug!("Rejected training document {}: {}", i + 1, e);
                e
            })?;
    }
    model.train()?;
    Ok(model)
}

fn report<T>(operation: &str, name: &str, result: Result<T, KinderError>) -> Result<T, KinderError> {
    if let Err(e) = &result {
        if e.is_lock_failure() {
            error!("{} '{}' not performed: {}", operation, name, e);
        } else {
            warn!("{} '{}' failed: {}", operation, name, e);
        }
    }
    result
}
