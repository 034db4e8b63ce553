const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "but", "by", "do", "for", "from", "had",
    "has", "have", "he", "her", "his", "i", "if", "in", "is", "it", "its", "me", "my", "of", "on",
    "or", "our", "she", "so", "that", "the", "their", "them", "they", "this", "to", "was", "we",
    "were", "what", "with", "you", "your",
];

/// Splits text into lowercase alphanumeric words, dropping stop words and
/// stripping simple plural endings.
pub(crate) fn tokenize_and_stem(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .map(|word| stem(&word))
        .collect()
}

fn stem(word: &str) -> String {
    if word.len() > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Turns per-label log scores into probabilities that sum to one.
pub(crate) fn normalize_log_scores(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![0.0; scores.len()];
    }
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words() {
        assert_eq!(tokenize_and_stem("I like apples"), vec!["like", "apple"]);
        assert_eq!(tokenize_and_stem("The CARS, the berries!"), vec!["car", "berry"]);
    }

    #[test]
    fn test_stem_keeps_short_and_double_s_words() {
        assert_eq!(stem("gas"), "gas");
        assert_eq!(stem("glass"), "glass");
        assert_eq!(stem("bus"), "bus");
    }

    #[test]
    fn test_normalize_log_scores() {
        let probs = normalize_log_scores(&[0.0, 0.0]);
        assert_eq!(probs, vec![0.5, 0.5]);

        let probs = normalize_log_scores(&[-1.0, -3.0, -2.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(probs[0] > probs[2] && probs[2] > probs[1]);
    }
}
