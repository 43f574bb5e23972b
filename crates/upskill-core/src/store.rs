//! Quiz persistence.
//!
//! The store owns identity: it assigns ids and timestamps to generated
//! questions and to evaluated answers, keyed by learner name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{CanonicalQuestion, EvaluationResult, GeneratedQuestion, OptionLetter};

/// A generated question as persisted for a learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredQuestion {
    pub id: Uuid,
    pub learner: String,
    pub question_text: String,
    pub options: [String; 4],
    pub correct_answer_text: String,
    pub created_at: DateTime<Utc>,
}

impl StoredQuestion {
    /// Options as a lettered listing, one per line ("A) text").
    pub fn options_listing(&self) -> String {
        OptionLetter::ALL
            .iter()
            .map(|letter| format!("{letter}) {}", self.options[letter.index()]))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<&StoredQuestion> for CanonicalQuestion {
    fn from(q: &StoredQuestion) -> Self {
        Self {
            question_text: q.question_text.clone(),
            correct_answer_text: q.correct_answer_text.clone(),
        }
    }
}

/// An evaluated answer as persisted for a learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: Uuid,
    pub learner: String,
    pub question_text: String,
    pub user_answer_text: String,
    pub correct_answer_text: Option<String>,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Persistence for generated questions and evaluated answers.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Append questions for a learner, creating the learner if needed.
    async fn save_questions(
        &self,
        learner: &str,
        questions: &[GeneratedQuestion],
    ) -> Result<Vec<StoredQuestion>, StoreError>;

    /// All questions stored for a learner, oldest first.
    async fn questions_for(&self, learner: &str) -> Result<Vec<StoredQuestion>, StoreError>;

    /// Record the verdicts of one quiz attempt.
    async fn save_answers(
        &self,
        learner: &str,
        results: &[EvaluationResult],
    ) -> Result<Vec<AnswerRecord>, StoreError>;

    /// All answers recorded for a learner, oldest first.
    async fn answers_for(&self, learner: &str) -> Result<Vec<AnswerRecord>, StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LearnerRecords {
    #[serde(default)]
    questions: Vec<StoredQuestion>,
    #[serde(default)]
    answers: Vec<AnswerRecord>,
}

/// Everything a store holds; also the on-disk format of [`JsonFileStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    learners: BTreeMap<String, LearnerRecords>,
}

impl StoreDocument {
    fn save_questions(&mut self, learner: &str, questions: &[GeneratedQuestion]) -> Vec<StoredQuestion> {
        let now = Utc::now();
        let stored: Vec<StoredQuestion> = questions
            .iter()
            .map(|q| StoredQuestion {
                id: Uuid::new_v4(),
                learner: learner.to_string(),
                question_text: q.question_text.clone(),
                options: q.options.clone(),
                correct_answer_text: q.correct_answer_text.clone(),
                created_at: now,
            })
            .collect();
        self.learners
            .entry(learner.to_string())
            .or_default()
            .questions
            .extend(stored.iter().cloned());
        stored
    }

    fn records(&self, learner: &str) -> Result<&LearnerRecords, StoreError> {
        self.learners
            .get(learner)
            .ok_or_else(|| StoreError::UnknownLearner(learner.to_string()))
    }

    fn save_answers(
        &mut self,
        learner: &str,
        results: &[EvaluationResult],
    ) -> Result<Vec<AnswerRecord>, StoreError> {
        let records = self
            .learners
            .get_mut(learner)
            .ok_or_else(|| StoreError::UnknownLearner(learner.to_string()))?;
        let now = Utc::now();
        let saved: Vec<AnswerRecord> = results
            .iter()
            .map(|r| AnswerRecord {
                id: Uuid::new_v4(),
                learner: learner.to_string(),
                question_text: r.question_text.clone(),
                user_answer_text: r.user_answer_text.clone(),
                correct_answer_text: r.correct_answer_text.clone(),
                is_correct: r.is_correct,
                answered_at: now,
            })
            .collect();
        records.answers.extend(saved.iter().cloned());
        Ok(saved)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A process-local store, mainly for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn save_questions(
        &self,
        learner: &str,
        questions: &[GeneratedQuestion],
    ) -> Result<Vec<StoredQuestion>, StoreError> {
        Ok(self.inner.write().await.save_questions(learner, questions))
    }

    async fn questions_for(&self, learner: &str) -> Result<Vec<StoredQuestion>, StoreError> {
        Ok(self.inner.read().await.records(learner)?.questions.clone())
    }

    async fn save_answers(
        &self,
        learner: &str,
        results: &[EvaluationResult],
    ) -> Result<Vec<AnswerRecord>, StoreError> {
        self.inner.write().await.save_answers(learner, results)
    }

    async fn answers_for(&self, learner: &str) -> Result<Vec<AnswerRecord>, StoreError> {
        Ok(self.inner.read().await.records(learner)?.answers.clone())
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// A store backed by a single JSON document on disk.
///
/// The file is re-read on every call and replaced through a temp file on
/// every write, so several processes can share it as long as they do not
/// write at the same moment.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoreDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    async fn persist(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc).map_err(|source| StoreError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl QuizStore for JsonFileStore {
    async fn save_questions(
        &self,
        learner: &str,
        questions: &[GeneratedQuestion],
    ) -> Result<Vec<StoredQuestion>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let stored = doc.save_questions(learner, questions);
        self.persist(&doc).await?;
        tracing::debug!(learner, count = stored.len(), path = %self.path.display(), "saved questions");
        Ok(stored)
    }

    async fn questions_for(&self, learner: &str) -> Result<Vec<StoredQuestion>, StoreError> {
        Ok(self.load().await?.records(learner)?.questions.clone())
    }

    async fn save_answers(
        &self,
        learner: &str,
        results: &[EvaluationResult],
    ) -> Result<Vec<AnswerRecord>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let saved = doc.save_answers(learner, results)?;
        self.persist(&doc).await?;
        Ok(saved)
    }

    async fn answers_for(&self, learner: &str) -> Result<Vec<AnswerRecord>, StoreError> {
        Ok(self.load().await?.records(learner)?.answers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(stem: &str, answer: OptionLetter) -> GeneratedQuestion {
        GeneratedQuestion::new(
            stem.into(),
            ["alpha".into(), "beta".into(), "gamma".into(), "delta".into()],
            answer,
        )
    }

    fn verdict(position: usize, question: &str, correct: bool) -> EvaluationResult {
        EvaluationResult {
            position,
            question_text: question.into(),
            user_answer_text: "beta".into(),
            correct_answer_text: Some("beta".into()),
            is_correct: correct,
        }
    }

    #[test]
    fn options_listing_uses_letters() {
        let stored = StoreDocument::default()
            .save_questions("sam", &[question("Q?", OptionLetter::A)])
            .remove(0);
        assert_eq!(
            stored.options_listing(),
            "A) alpha\nB) beta\nC) gamma\nD) delta"
        );
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        let saved = store
            .save_questions("sam", &[question("Q1?", OptionLetter::B), question("Q2?", OptionLetter::D)])
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert_ne!(saved[0].id, saved[1].id);

        let loaded = store.questions_for("sam").await.unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded[1].correct_answer_text, "delta");

        assert!(store.answers_for("sam").await.unwrap().is_empty());
        store
            .save_answers("sam", &[verdict(1, "Q1?", true)])
            .await
            .unwrap();
        let answers = store.answers_for("sam").await.unwrap();
        assert_eq!(answers.len(), 1);
        assert!(answers[0].is_correct);
    }

    #[tokio::test]
    async fn unknown_learner() {
        let store = MemoryStore::new();
        let err = store.questions_for("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownLearner(ref name) if name == "ghost"));
        assert!(store
            .save_answers("ghost", &[verdict(1, "Q", false)])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn questions_accumulate_per_learner() {
        let store = MemoryStore::new();
        store.save_questions("a", &[question("A1?", OptionLetter::A)]).await.unwrap();
        store.save_questions("b", &[question("B1?", OptionLetter::A)]).await.unwrap();
        store.save_questions("a", &[question("A2?", OptionLetter::C)]).await.unwrap();

        let stems: Vec<_> = store
            .questions_for("a")
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.question_text)
            .collect();
        assert_eq!(stems, vec!["A1?", "A2?"]);
        assert_eq!(store.questions_for("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn json_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::new(&path);
        store
            .save_questions("sam", &[question("Q1?", OptionLetter::C)])
            .await
            .unwrap();
        store
            .save_answers("sam", &[verdict(1, "Q1?", false)])
            .await
            .unwrap();
        assert!(path.exists());

        let reopened = JsonFileStore::new(&path);
        let questions = reopened.questions_for("sam").await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer_text, "gamma");
        let answers = reopened.answers_for("sam").await.unwrap();
        assert_eq!(answers.len(), 1);
        assert!(!answers[0].is_correct);
    }

    #[tokio::test]
    async fn json_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(matches!(
            store.questions_for("sam").await,
            Err(StoreError::UnknownLearner(_))
        ));
    }

    #[tokio::test]
    async fn json_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        let err = store.questions_for("sam").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
