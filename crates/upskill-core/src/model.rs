//! Core data model types for upskill.
//!
//! These are the request-scoped value types that flow through the parser,
//! the evaluator and the quiz service.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Positional label of one of the four options of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    /// All letters in display order.
    pub const ALL: [OptionLetter; 4] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    /// Zero-based position of this letter in an options array.
    pub fn index(self) -> usize {
        match self {
            OptionLetter::A => 0,
            OptionLetter::B => 1,
            OptionLetter::C => 2,
            OptionLetter::D => 3,
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionLetter::A => write!(f, "A"),
            OptionLetter::B => write!(f, "B"),
            OptionLetter::C => write!(f, "C"),
            OptionLetter::D => write!(f, "D"),
        }
    }
}

impl TryFrom<char> for OptionLetter {
    type Error = String;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'A' => Ok(OptionLetter::A),
            'B' => Ok(OptionLetter::B),
            'C' => Ok(OptionLetter::C),
            'D' => Ok(OptionLetter::D),
            other => Err(format!("not an option letter: {other}")),
        }
    }
}

impl FromStr for OptionLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => OptionLetter::try_from(c),
            _ => Err(format!("not an option letter: {s}")),
        }
    }
}

/// A multiple-choice question extracted from generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    /// The question stem.
    pub question_text: String,
    /// Option texts in A, B, C, D order.
    pub options: [String; 4],
    /// Text of the correct option (never the letter).
    pub correct_answer_text: String,
}

impl GeneratedQuestion {
    /// Build a question, resolving the answer letter to its option text.
    pub fn new(question_text: String, options: [String; 4], answer: OptionLetter) -> Self {
        let correct_answer_text = options[answer.index()].clone();
        Self {
            question_text,
            options,
            correct_answer_text,
        }
    }

    /// Option text for the given letter.
    pub fn option(&self, letter: OptionLetter) -> &str {
        &self.options[letter.index()]
    }
}

/// The stored ground truth for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalQuestion {
    pub question_text: String,
    pub correct_answer_text: String,
}

impl From<&GeneratedQuestion> for CanonicalQuestion {
    fn from(q: &GeneratedQuestion) -> Self {
        Self {
            question_text: q.question_text.clone(),
            correct_answer_text: q.correct_answer_text.clone(),
        }
    }
}

/// One answer submitted by a learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    #[serde(alias = "question")]
    pub question_text: String,
    #[serde(alias = "user_answer")]
    pub user_answer_text: String,
}

impl SubmittedAnswer {
    pub fn new(question_text: impl Into<String>, user_answer_text: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            user_answer_text: user_answer_text.into(),
        }
    }
}

/// Verdict for one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 1-based position in the submitted batch.
    pub position: usize,
    pub question_text: String,
    pub user_answer_text: String,
    /// `None` when no stored question matched the submitted text.
    pub correct_answer_text: Option<String>,
    pub is_correct: bool,
}

impl EvaluationResult {
    /// Human-readable pass/fail annotation.
    pub fn status(&self) -> String {
        if self.is_correct {
            "Correct".to_string()
        } else {
            format!(
                "Wrong (Correct: {})",
                self.correct_answer_text.as_deref().unwrap_or("N/A")
            )
        }
    }
}

/// Aggregate outcome of evaluating a batch of answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub correct_count: usize,
    /// Number of canonical questions, not number of submissions.
    pub total_count: usize,
    pub results: Vec<EvaluationResult>,
}

impl EvaluationSummary {
    /// The "X out of Y" score line.
    pub fn score_line(&self) -> String {
        format!("{} out of {}", self.correct_count, self.total_count)
    }

    /// `correct_count / total_count`, or `None` when there were no questions.
    pub fn score_fraction(&self) -> Option<f64> {
        if self.total_count == 0 {
            None
        } else {
            Some(self.correct_count as f64 / self.total_count as f64)
        }
    }
}

/// What we know about a learner when asking for questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub name: String,
    #[serde(default)]
    pub skill_gaps: Vec<String>,
    /// Skill name to self-assessed level (e.g. "rust" = "beginner").
    #[serde(default)]
    pub proficiency: BTreeMap<String, String>,
}
