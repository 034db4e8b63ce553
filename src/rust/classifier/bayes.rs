use std::collections::{BTreeMap, HashMap, HashSet};
use log::debug;

use super::error::ModelError;
use super::utils::{normalize_log_scores, tokenize_and_stem};
use super::{Classification, Model};

const DEFAULT_SMOOTHING: f64 = 1.0;

#[derive(Debug, Clone, Default)]
struct LabelStats {
    documents: usize,
    token_counts: HashMap<String, usize>,
    total_tokens: usize,
}

/// Multinomial naive Bayes text classifier with additive smoothing.
///
/// Documents are only queued by `add_document`; the label statistics are
/// computed in one pass by `train`. Until then the model answers every query
/// with an empty classification.
///
/// ```rust
/// use kinder::{BayesModel, Model};
///
/// let mut model = BayesModel::default();
/// model.add_document("I like apples", "fruit").unwrap();
/// model.add_document("I like cars", "vehicle").unwrap();
/// model.train().unwrap();
///
/// assert_eq!(model.classify("I love apples").as_deref(), Some("fruit"));
/// ```
#[derive(Debug, Clone)]
pub struct BayesModel {
    smoothing: f64,
    pending: Vec<(Vec<String>, String)>,
    labels: BTreeMap<String, LabelStats>,
    vocabulary: HashSet<String>,
    total_documents: usize,
}

impl Default for BayesModel {
    fn default() -> Self {
        Self::with_smoothing(DEFAULT_SMOOTHING)
    }
}

impl BayesModel {
    /// Creates an untrained model using `smoothing` as the additive (Laplace)
    /// pseudo-count. Non-positive or non-finite values fall back to 1.0.
    pub fn with_smoothing(smoothing: f64) -> Self {
        let smoothing = if smoothing.is_finite() && smoothing > 0.0 {
            smoothing
        } else {
            DEFAULT_SMOOTHING
        };
        Self {
            smoothing,
            pending: Vec::new(),
            labels: BTreeMap::new(),
            vocabulary: HashSet::new(),
            total_documents: 0,
        }
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn is_trained(&self) -> bool {
        self.total_documents > 0
    }

    fn log_score(&self, stats: &LabelStats, tokens: &[String]) -> f64 {
        let prior = (stats.documents as f64 / self.total_documents as f64).ln();
        let denominator = stats.total_tokens as f64 + self.smoothing * self.vocabulary.len() as f64;

        tokens.iter()
            .filter(|token| self.vocabulary.contains(*token))
            .map(|token| {
                let count = stats.token_counts.get(token).copied().unwrap_or(0) as f64;
                ((count + self.smoothing) / denominator).ln()
            })
            .fold(prior, |acc, term| acc + term)
    }
}

impl Model for BayesModel {
    fn add_document(&mut self, text: &str, label: &str) -> Result<(), ModelError> {
        if text.trim().is_empty() {
            return Err(ModelError::MalformedDocument(format!(
                "document {} for label '{}' has no text",
                self.pending.len() + 1,
                label
            )));
        }
        if label.trim().is_empty() {
            return Err(ModelError::MalformedDocument(format!(
                "document {} has an empty label",
                self.pending.len() + 1
            )));
        }
        self.pending.push((tokenize_and_stem(text), label.to_string()));
        Ok(())
    }

    fn train(&mut self) -> Result<(), ModelError> {
        if self.pending.is_empty() {
            return Err(ModelError::NoDocuments);
        }

        let mut labels: BTreeMap<String, LabelStats> = BTreeMap::new();
        let mut vocabulary = HashSet::new();
        for (tokens, label) in &self.pending {
            let stats = labels.entry(label.clone()).or_default();
            stats.documents += 1;
            stats.total_tokens += tokens.len();
            for token in tokens {
                *stats.token_counts.entry(token.clone()).or_insert(0) += 1;
                vocabulary.insert(token.clone());
            }
        }

        debug!(
            "Fitted {} documents across {} labels ({} distinct tokens)",
            self.pending.len(),
            labels.len(),
            vocabulary.len()
        );

        self.total_documents = self.pending.len();
        self.labels = labels;
        self.vocabulary = vocabulary;
        Ok(())
    }

    fn classifications(&self, text: &str) -> Vec<Classification> {
        if !self.is_trained() {
            return Vec::new();
        }

        let tokens = tokenize_and_stem(text);
        let log_scores: Vec<f64> = self.labels.values()
            .map(|stats| self.log_score(stats, &tokens))
            .collect();
        let probabilities = normalize_log_scores(&log_scores);

        let mut ranked: Vec<Classification> = self.labels.keys()
            .zip(probabilities)
            .map(|(label, value)| Classification { label: label.clone(), value })
            .collect();
        // Stable sort keeps ties in label order
        ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    fn labels(&self) -> Vec<String> {
        self.labels.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit_model() -> BayesModel {
        let mut model = BayesModel::default();
        model.add_document("I like apples", "fruit").unwrap();
        model.add_document("bananas and pears are sweet", "fruit").unwrap();
        model.add_document("I like cars", "vehicle").unwrap();
        model.add_document("trucks need diesel", "vehicle").unwrap();
        model.train().unwrap();
        model
    }

    #[test]
    fn test_untrained_model_is_degenerate() {
        let model = BayesModel::default();
        assert!(!model.is_trained());
        assert!(model.classifications("anything").is_empty());
        assert_eq!(model.classify("anything"), None);
        assert!(model.labels().is_empty());
    }

    #[test]
    fn test_classify_picks_best_label() {
        let model = fruit_model();
        assert_eq!(model.classify("I love apples").as_deref(), Some("fruit"));
        assert_eq!(model.classify("a red truck").as_deref(), Some("vehicle"));
        assert_eq!(model.labels(), vec!["fruit", "vehicle"]);
    }

    #[test]
    fn test_classifications_are_ranked_probabilities() {
        let model = fruit_model();
        let ranked = model.classifications("sweet pears");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].label, "fruit");
        assert!(ranked[0].value > ranked[1].value);
        let total: f64 = ranked.iter().map(|c| c.value).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_words_fall_back_to_priors() {
        let model = fruit_model();
        let ranked = model.classifications("zzz qqq");
        assert_eq!(ranked.len(), 2);
        assert!((ranked[0].value - 0.5).abs() < 1e-9);
        assert_eq!(ranked[0].label, "fruit");
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        let mut model = BayesModel::default();
        assert!(matches!(
            model.add_document("", "fruit"),
            Err(ModelError::MalformedDocument(_))
        ));
        assert!(matches!(
            model.add_document("apples", " "),
            Err(ModelError::MalformedDocument(_))
        ));
        assert_eq!(model.train(), Err(ModelError::NoDocuments));
    }

    #[test]
    fn test_smoothing_validation() {
        assert_eq!(BayesModel::with_smoothing(0.5).smoothing(), 0.5);
        assert_eq!(BayesModel::with_smoothing(0.0).smoothing(), DEFAULT_SMOOTHING);
        assert_eq!(BayesModel::with_smoothing(f64::NAN).smoothing(), DEFAULT_SMOOTHING);
    }
}
