//! Answer evaluation.
//!
//! Scores a batch of submitted answers against the canonical answers stored
//! when the questions were generated. Matching is on full answer text,
//! ignoring case and surrounding whitespace; there is no partial credit.

use std::collections::HashMap;

use crate::model::{CanonicalQuestion, EvaluationResult, EvaluationSummary, SubmittedAnswer};

/// Canonical question text to correct answer text, for one evaluation.
///
/// Keys are trimmed on insertion. Values are kept as stored; normalization
/// happens at comparison time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerKey {
    answers: HashMap<String, String>,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key from stored questions. On duplicate question text the
    /// last one wins.
    pub fn from_questions<I>(questions: I) -> Self
    where
        I: IntoIterator<Item = CanonicalQuestion>,
    {
        questions
            .into_iter()
            .map(|q| (q.question_text, q.correct_answer_text))
            .collect()
    }

    /// Insert an entry, returning the previous answer for the same question.
    pub fn insert(
        &mut self,
        question_text: impl AsRef<str>,
        correct_answer_text: impl Into<String>,
    ) -> Option<String> {
        let key = question_text.as_ref().trim().to_string();
        let previous = self.answers.insert(key, correct_answer_text.into());
        if previous.is_some() {
            tracing::warn!(
                question = question_text.as_ref().trim(),
                "duplicate question text in answer key, keeping the last answer"
            );
        }
        previous
    }

    /// The stored answer for a question, matched after trimming.
    pub fn get(&self, question_text: &str) -> Option<&str> {
        self.answers.get(question_text.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<(String, String)> for AnswerKey {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut key = AnswerKey::new();
        for (question, answer) in iter {
            key.insert(question, answer);
        }
        key
    }
}

impl From<HashMap<String, String>> for AnswerKey {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// Normalize an answer for comparison.
fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Whether two answers match, ignoring case and surrounding whitespace.
pub fn answers_match(user_answer: &str, correct_answer: &str) -> bool {
    normalize(user_answer) == normalize(correct_answer)
}

/// Score submitted answers against the answer key.
///
/// `total_count` is the size of the key regardless of how many answers were
/// submitted. Answers to unknown questions are scored incorrect. Repeated
/// submissions of the same question are each scored on their own.
pub fn evaluate(canonical: &AnswerKey, submitted: &[SubmittedAnswer]) -> EvaluationSummary {
    let mut correct_count = 0;

    let results = submitted
        .iter()
        .enumerate()
        .map(|(idx, answer)| {
            let correct_answer_text = canonical.get(&answer.question_text).map(str::to_string);
            let is_correct = correct_answer_text
                .as_deref()
                .is_some_and(|correct| answers_match(&answer.user_answer_text, correct));
            if is_correct {
                correct_count += 1;
            } else if correct_answer_text.is_none() {
                tracing::debug!(
                    question = answer.question_text.as_str(),
                    "submitted answer has no stored question"
                );
            }

            EvaluationResult {
                position: idx + 1,
                question_text: answer.question_text.clone(),
                user_answer_text: answer.user_answer_text.clone(),
                correct_answer_text,
                is_correct,
            }
        })
        .collect();

    EvaluationSummary {
        correct_count,
        total_count: canonical.len(),
        results,
    }
}
