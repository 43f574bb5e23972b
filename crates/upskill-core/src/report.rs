//! Quiz report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::EvaluationSummary;

/// The learner-facing outcome of one quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// Learner who took the quiz.
    pub learner: String,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// "X out of Y".
    pub score: String,
    pub correct_count: usize,
    pub total_count: usize,
    /// One entry per submitted answer, in submission order.
    pub detailed_results: Vec<DetailedResult>,
}

/// Per-question line of a [`QuizReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedResult {
    pub position: usize,
    pub question: String,
    pub your_answer: String,
    /// "Correct" or "Wrong (Correct: ...)".
    pub status: String,
}

impl QuizReport {
    /// Build a report from an evaluation summary.
    pub fn from_summary(learner: &str, summary: &EvaluationSummary) -> Self {
        let detailed_results = summary
            .results
            .iter()
            .map(|r| DetailedResult {
                position: r.position,
                question: r.question_text.clone(),
                your_answer: r.user_answer_text.clone(),
                status: r.status(),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            learner: learner.to_string(),
            created_at: Utc::now(),
            score: summary.score_line(),
            correct_count: summary.correct_count,
            total_count: summary.total_count,
            detailed_results,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: QuizReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Render the report as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## Quiz results for {}\n\n**Score:** {}\n\n",
            self.learner, self.score
        ));

        if self.detailed_results.is_empty() {
            md.push_str("_No answers submitted._\n");
            return md;
        }

        md.push_str("| # | Question | Your answer | Status |\n");
        md.push_str("|---|----------|-------------|--------|\n");
        for r in &self.detailed_results {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                r.position,
                escape_cell(&r.question),
                escape_cell(&r.your_answer),
                escape_cell(&r.status)
            ));
        }

        md
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{evaluate, AnswerKey};
    use crate::model::SubmittedAnswer;

    fn sample_report() -> QuizReport {
        let key: AnswerKey = vec![
            ("Capital of France?".to_string(), "Paris".to_string()),
            ("2+2?".to_string(), "4".to_string()),
        ]
        .into_iter()
        .collect();
        let summary = evaluate(
            &key,
            &[
                SubmittedAnswer::new("Capital of France?", "paris"),
                SubmittedAnswer::new("2+2?", "5"),
            ],
        );
        QuizReport::from_summary("sam", &summary)
    }

    #[test]
    fn from_summary_builds_score_and_statuses() {
        let report = sample_report();
        assert_eq!(report.score, "1 out of 2");
        assert_eq!(report.detailed_results[0].status, "Correct");
        assert_eq!(report.detailed_results[1].status, "Wrong (Correct: 4)");
        assert_eq!(report.detailed_results[1].your_answer, "5");
    }

    #[test]
    fn json_roundtrip() {
        let report = sample_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("quiz.json");

        report.save_json(&path).unwrap();
        let loaded = QuizReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.detailed_results.len(), 2);
    }

    #[test]
    fn markdown_output() {
        let md = sample_report().to_markdown();
        assert!(md.contains("**Score:** 1 out of 2"));
        assert!(md.contains("| 2 | 2+2? | 5 | Wrong (Correct: 4) |"));
    }

    #[test]
    fn markdown_escapes_pipes() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b<br>c");
    }
}
