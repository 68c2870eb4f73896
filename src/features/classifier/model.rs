//! Bag-of-words multi-class perceptron
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::HashMap;

use super::IntentLabel;
use crate::core::ClassificationError;

/// One (text, label) pair fed to training
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    pub text: String,
    pub label: IntentLabel,
}

impl TrainingExample {
    pub fn new(text: impl Into<String>, label: IntentLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Immutable trained model. Replaced wholesale on retrain.
#[derive(Debug, Clone)]
pub struct ClassifierState {
    vocabulary: HashMap<String, usize>,
    max_sequence_length: usize,
    labels: Vec<IntentLabel>,
    /// One row per label; the last column of each row is the bias
    weights: Vec<Vec<f32>>,
    example_count: usize,
    epochs_run: usize,
}

/// Lower-cased whitespace tokenization shared by training and classification
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Fit a model on the union of seed and corrected examples.
///
/// Training stops early once an epoch makes no mistakes.
pub fn train(
    seed_examples: &[TrainingExample],
    corrected_examples: &[TrainingExample],
    epochs: usize,
) -> Result<ClassifierState, ClassificationError> {
    let examples: Vec<&TrainingExample> =
        seed_examples.iter().chain(corrected_examples.iter()).collect();
    if examples.is_empty() {
        return Err(ClassificationError::NoExamples);
    }

    let mut vocabulary = HashMap::new();
    let mut max_sequence_length = 0;
    let tokenized: Vec<Vec<String>> = examples.iter().map(|e| tokenize(&e.text)).collect();
    for tokens in &tokenized {
        max_sequence_length = max_sequence_length.max(tokens.len());
        for token in tokens {
            let next = vocabulary.len();
            vocabulary.entry(token.clone()).or_insert(next);
        }
    }

    let labels = IntentLabel::ALL.to_vec();
    let mut state = ClassifierState {
        weights: vec![vec![0.0; vocabulary.len() + 1]; labels.len()],
        vocabulary,
        max_sequence_length,
        labels,
        example_count: examples.len(),
        epochs_run: 0,
    };

    let features: Vec<Vec<(usize, f32)>> =
        tokenized.iter().map(|tokens| state.featurize(tokens)).collect();

    for epoch in 0..epochs {
        let mut mistakes = 0;
        for (example, x) in examples.iter().zip(&features) {
            let predicted = state.argmax(x);
            let expected = state.label_index(example.label);
            if predicted != expected {
                mistakes += 1;
                for &(index, value) in x {
                    state.weights[expected][index] += value;
                    state.weights[predicted][index] -= value;
                }
            }
        }
        state.epochs_run = epoch + 1;
        if mistakes == 0 {
            break;
        }
    }

    Ok(state)
}

impl ClassifierState {
    /// Predict a label; out-of-vocabulary tokens are ignored
    pub fn classify(&self, text: &str) -> Result<IntentLabel, ClassificationError> {
        let x = self.featurize(&tokenize(text));
        // Only the bias term survived
        if x.len() <= 1 {
            return Err(ClassificationError::EmptyFeatures);
        }
        Ok(self.labels[self.argmax(&x)])
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    pub fn example_count(&self) -> usize {
        self.example_count
    }

    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    /// Sparse token counts over the first `max_sequence_length` tokens, plus bias
    fn featurize(&self, tokens: &[String]) -> Vec<(usize, f32)> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokens.iter().take(self.max_sequence_length) {
            if let Some(&index) = self.vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        let mut x: Vec<(usize, f32)> = counts.into_iter().collect();
        x.sort_unstable_by_key(|&(index, _)| index);
        x.push((self.vocabulary.len(), 1.0));
        x
    }

    fn score(&self, label: usize, x: &[(usize, f32)]) -> f32 {
        x.iter().map(|&(i, v)| self.weights[label][i] * v).sum()
    }

    /// Ties go to the earliest label
    fn argmax(&self, x: &[(usize, f32)]) -> usize {
        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for label in 0..self.labels.len() {
            let score = self.score(label, x);
            if score > best_score {
                best = label;
                best_score = score;
            }
        }
        best
    }

    fn label_index(&self, label: IntentLabel) -> usize {
        self.labels.iter().position(|l| *l == label).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_set() -> Vec<TrainingExample> {
        vec![
            TrainingExample::new("remind me to call mom", IntentLabel::Reminder),
            TrainingExample::new("remind me about rent tomorrow", IntentLabel::Reminder),
            TrainingExample::new("what is the capital of peru", IntentLabel::Other),
            TrainingExample::new("tell me a joke", IntentLabel::Other),
            TrainingExample::new("play some jazz", IntentLabel::Media),
            TrainingExample::new("play the lion king song", IntentLabel::Media),
        ]
    }

    #[test]
    fn test_tokenize_lowercases_and_splits_on_whitespace() {
        assert_eq!(tokenize("  Remind ME\tnow.  "), vec!["remind", "me", "now."]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_train_requires_examples() {
        assert_eq!(train(&[], &[], 10).unwrap_err(), ClassificationError::NoExamples);
    }

    #[test]
    fn test_classifies_training_set() {
        let examples = tiny_set();
        let state = train(&examples, &[], 50).unwrap();
        for example in &examples {
            assert_eq!(state.classify(&example.text).unwrap(), example.label, "{}", example.text);
        }
        assert_eq!(state.max_sequence_length(), 6);
        assert_eq!(state.example_count(), 6);
    }

    #[test]
    fn test_unknown_tokens_are_dropped() {
        let state = train(&tiny_set(), &[], 50).unwrap();
        assert_eq!(state.classify("zzz play qqq jazz").unwrap(), IntentLabel::Media);
    }

    #[test]
    fn test_all_unknown_tokens_is_degenerate() {
        let state = train(&tiny_set(), &[], 50).unwrap();
        assert_eq!(state.classify("xylophone quux").unwrap_err(), ClassificationError::EmptyFeatures);
        assert_eq!(state.classify("").unwrap_err(), ClassificationError::EmptyFeatures);
    }

    #[test]
    fn test_input_longer_than_training_is_truncated() {
        let state = train(&tiny_set(), &[], 50).unwrap();
        let long = format!("play some jazz {}", "zzz ".repeat(50));
        assert_eq!(state.classify(&long).unwrap(), IntentLabel::Media);
    }

    #[test]
    fn test_corrected_examples_extend_training() {
        let corrected = vec![TrainingExample::new("queue up lofi beats", IntentLabel::Media)];
        let state = train(&tiny_set(), &corrected, 50).unwrap();
        assert_eq!(state.classify("queue up lofi beats").unwrap(), IntentLabel::Media);
        assert_eq!(state.example_count(), 7);
    }
}
