//! A registry of named, independently trained text classifiers.
//!
//! Each classifier is addressed by a caller-chosen name. Operations on the same
//! name are serialized by a per-name asynchronous lock, while operations on
//! different names never wait on each other.
//!
//! # Basic Usage
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kinder::{ClassifierRegistry, TrainingDocument};
//!
//! let registry = ClassifierRegistry::new();
//! registry.create_classifier("fruit").await?;
//! registry.train(vec![
//!     TrainingDocument::new("I like apples", "fruit"),
//!     TrainingDocument::new("I like cars", "vehicle"),
//! ], "fruit").await?;
//!
//! let details = registry.classify_details("I love apples", "fruit").await?;
//! println!("Best match: {}", details[0].label);
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! The registry is `Send + Sync` and is meant to be shared through an `Arc`:
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kinder::{ClassifierRegistry, TrainingDocument};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ClassifierRegistry::new());
//! registry.create_classifier("fruit").await?;
//!
//! let trainer = Arc::clone(&registry);
//! let training = tokio::spawn(async move {
//!     trainer.train(vec![TrainingDocument::new("apples", "fruit")], "fruit").await
//! });
//!
//! // Sees either the untrained model or the trained one, never a mixture
//! let label = registry.classify("apples", "fruit").await?;
//! assert!(label.is_none() || label.as_deref() == Some("fruit"));
//! training.await??;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod config;
pub mod locks;
pub mod registry;

pub use classifier::{BayesModel, Classification, ClassifierInfo, Model, ModelError};
pub use config::{RegistryConfig, LOCK_TIMEOUT_ENV};
pub use locks::{LockError, NameGuard, NameLocks};
pub use registry::{load_training_set, ClassifierRegistry, KinderError, TrainingDocument};

pub fn init_logger() {
    env_logger::init();
}
