//! Quiz workflow orchestration.
//!
//! Ties the collaborators together: prompt → generator → parser → store for
//! question generation, and store → evaluator → store for quiz scoring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::ProviderError;
use crate::evaluator::{evaluate, AnswerKey};
use crate::model::{CanonicalQuestion, EvaluationSummary, LearnerProfile, SubmittedAnswer};
use crate::parser::parse_mcqs_detailed;
use crate::prompt::{build_prompt, DEFAULT_QUESTION_COUNT, SYSTEM_PROMPT};
use crate::report::QuizReport;
use crate::store::{QuizStore, StoredQuestion};
use crate::traits::{GenerateRequest, GenerateResponse, QuestionGenerator, TokenUsage};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the quiz service.
#[derive(Debug, Clone)]
pub struct QuizServiceConfig {
    /// Model identifier passed to the generator.
    pub model: String,
    /// Questions requested per generation.
    pub question_count: usize,
    /// Temperature for generation.
    pub temperature: f64,
    /// Max tokens for generation.
    pub max_tokens: u32,
    /// Retries on provider errors (not on parse results).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    /// Optional system prompt override.
    pub system_prompt_override: Option<String>,
}

impl Default for QuizServiceConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-pro".to_string(),
            question_count: DEFAULT_QUESTION_COUNT,
            temperature: 0.7,
            max_tokens: 2048,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            system_prompt_override: None,
        }
    }
}

/// Result of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Questions as stored for the learner.
    pub questions: Vec<StoredQuestion>,
    /// Blocks in the model output that could not be parsed.
    pub skipped: usize,
    /// The raw model output.
    pub raw_text: String,
    /// Model that produced the text.
    pub model: String,
    pub token_usage: TokenUsage,
}

/// The quiz workflow.
pub struct QuizService {
    generator: Arc<dyn QuestionGenerator>,
    store: Arc<dyn QuizStore>,
    config: QuizServiceConfig,
}

impl QuizService {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        store: Arc<dyn QuizStore>,
        config: QuizServiceConfig,
    ) -> Self {
        Self {
            generator,
            store,
            config,
        }
    }

    /// Generate, parse and store questions for a learner.
    pub async fn generate_for(&self, profile: &LearnerProfile) -> Result<GenerationOutcome> {
        anyhow::ensure!(!profile.name.trim().is_empty(), "learner name is empty");
        anyhow::ensure!(
            self.config.question_count >= 1,
            "question count must be at least 1"
        );

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_prompt(profile, self.config.question_count),
            system_prompt: Some(
                self.config
                    .system_prompt_override
                    .clone()
                    .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
            ),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self.generate_with_retry(&request).await.with_context(|| {
            format!(
                "question generation failed for learner '{}' with {}",
                profile.name,
                self.generator.name()
            )
        })?;

        let parsed = parse_mcqs_detailed(&response.content);
        if parsed.questions.is_empty() {
            tracing::warn!(
                learner = profile.name.as_str(),
                "model output contained no well-formed questions"
            );
        } else if parsed.questions.len() < self.config.question_count {
            tracing::warn!(
                learner = profile.name.as_str(),
                requested = self.config.question_count,
                parsed = parsed.questions.len(),
                skipped = parsed.skipped,
                "fewer questions than requested"
            );
        }

        let questions = self
            .store
            .save_questions(&profile.name, &parsed.questions)
            .await
            .context("failed to store generated questions")?;

        tracing::info!(
            learner = profile.name.as_str(),
            stored = questions.len(),
            latency_ms = response.latency_ms,
            "questions generated"
        );

        Ok(GenerationOutcome {
            questions,
            skipped: parsed.skipped,
            raw_text: response.content,
            model: response.model,
            token_usage: response.token_usage,
        })
    }

    /// Score a learner's answers against their stored questions and record
    /// the verdicts.
    pub async fn take_quiz(&self, learner: &str, answers: &[SubmittedAnswer]) -> Result<QuizReport> {
        take_quiz(self.store.as_ref(), learner, answers).await
    }

    /// Evaluate answers against stored questions without touching the store.
    pub fn score_only(questions: &[StoredQuestion], answers: &[SubmittedAnswer]) -> EvaluationSummary {
        let key = AnswerKey::from_questions(questions.iter().map(CanonicalQuestion::from));
        evaluate(&key, answers)
    }

    /// Call the generator, retrying transient provider errors with
    /// exponential backoff.
    async fn generate_with_retry(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match self.generator.generate(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if let Some(provider_error) = e.downcast_ref::<ProviderError>() {
                        if provider_error.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = provider_error.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                        }
                    }
                    tracing::warn!(attempt = retry + 1, "generation attempt failed: {e:#}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
    }
}

/// Score answers against the learner's stored questions and record the
/// verdicts. Needs only a store, so scoring works without a generator.
pub async fn take_quiz(
    store: &dyn QuizStore,
    learner: &str,
    answers: &[SubmittedAnswer],
) -> Result<QuizReport> {
    let questions = store
        .questions_for(learner)
        .await
        .with_context(|| format!("failed to load questions for learner '{learner}'"))?;

    let summary = QuizService::score_only(&questions, answers);

    store
        .save_answers(learner, &summary.results)
        .await
        .context("failed to store answers")?;

    tracing::info!(
        learner,
        correct = summary.correct_count,
        total = summary.total_count,
        "quiz evaluated"
    );

    Ok(QuizReport::from_summary(learner, &summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::store::MemoryStore;
    use crate::traits::ModelInfo;

    const TWO_QUESTIONS: &str = "1. What is 2+2?\nA. 3\nB. 4\nC. 5\nD. 6\nAnswer: B\n\n2. Capital of France?\nA. Paris\nB. Rome\nC. Madrid\nD. Berlin\nAnswer: A\n";

    /// Replays a fixed list of outcomes, one per call.
    struct ScriptedGenerator {
        script: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
        calls: AtomicU32,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<std::result::Result<String, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl QuestionGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::NetworkError("script exhausted".into())));
            let content = next?;
            Ok(GenerateResponse {
                content,
                model: request.model.clone(),
                token_usage: TokenUsage::default(),
                latency_ms: 1,
            })
        }

        fn available_models(&self) -> Vec<ModelInfo> {
            vec![]
        }
    }

    fn profile(name: &str) -> LearnerProfile {
        LearnerProfile {
            name: name.into(),
            skill_gaps: vec!["arithmetic".into()],
            proficiency: BTreeMap::new(),
        }
    }

    fn service(generator: Arc<ScriptedGenerator>, store: Arc<MemoryStore>) -> QuizService {
        QuizService::new(generator, store, QuizServiceConfig::default())
    }

    #[tokio::test]
    async fn generate_parses_and_stores() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(TWO_QUESTIONS.into())]));
        let store = Arc::new(MemoryStore::new());
        let svc = service(generator.clone(), store.clone());

        let outcome = svc.generate_for(&profile("sam")).await.unwrap();
        assert_eq!(outcome.questions.len(), 2);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.questions[1].correct_answer_text, "Paris");
        assert_eq!(store.questions_for("sam").await.unwrap().len(), 2);

        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Skill gaps: arithmetic"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(ProviderError::Timeout(30)),
            Err(ProviderError::RateLimited { retry_after_ms: 10 }),
            Ok(TWO_QUESTIONS.into()),
        ]));
        let svc = service(generator.clone(), Arc::new(MemoryStore::new()));

        let outcome = svc.generate_for(&profile("sam")).await.unwrap();
        assert_eq!(outcome.questions.len(), 2);
        assert_eq!(generator.calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(ProviderError::AuthenticationFailed("bad key".into())),
            Ok(TWO_QUESTIONS.into()),
        ]));
        let svc = service(generator.clone(), Arc::new(MemoryStore::new()));

        let err = svc.generate_for(&profile("sam")).await.unwrap_err();
        assert!(format!("{err:#}").contains("authentication failed"));
        assert_eq!(generator.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let store = Arc::new(MemoryStore::new());
        let svc = service(generator.clone(), store.clone());

        assert!(svc.generate_for(&profile("sam")).await.is_err());
        assert_eq!(generator.calls.load(Ordering::Relaxed), 4);
        assert!(store.questions_for("sam").await.is_err());
    }

    #[tokio::test]
    async fn unparseable_output_is_not_an_error() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            "Recursion is when a function calls itself.".into(),
        )]));
        let svc = service(generator, Arc::new(MemoryStore::new()));

        let outcome = svc.generate_for(&profile("sam")).await.unwrap();
        assert!(outcome.questions.is_empty());
    }

    #[tokio::test]
    async fn rejects_empty_learner_name() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(TWO_QUESTIONS.into())]));
        let svc = service(generator.clone(), Arc::new(MemoryStore::new()));
        assert!(svc.generate_for(&profile("  ")).await.is_err());
        assert_eq!(generator.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn quiz_scores_and_records_answers() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(TWO_QUESTIONS.into())]));
        let store = Arc::new(MemoryStore::new());
        let svc = service(generator, store.clone());
        svc.generate_for(&profile("sam")).await.unwrap();

        let report = svc
            .take_quiz(
                "sam",
                &[
                    SubmittedAnswer::new("What is 2+2?", " 4"),
                    SubmittedAnswer::new("Capital of France?", "rome"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.score, "1 out of 2");
        assert_eq!(report.detailed_results[1].status, "Wrong (Correct: Paris)");

        let answers = store.answers_for("sam").await.unwrap();
        assert_eq!(answers.len(), 2);
        assert!(answers[0].is_correct);
        assert!(!answers[1].is_correct);
    }

    #[tokio::test]
    async fn quiz_for_unknown_learner_fails() {
        let svc = service(
            Arc::new(ScriptedGenerator::new(vec![])),
            Arc::new(MemoryStore::new()),
        );
        let err = svc
            .take_quiz("ghost", &[SubmittedAnswer::new("Q", "A")])
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("unknown learner: ghost"));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_hint_is_capped() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(ProviderError::RateLimited {
                retry_after_ms: 86_400_000,
            }),
            Ok(TWO_QUESTIONS.into()),
        ]));
        let svc = service(generator.clone(), Arc::new(MemoryStore::new()));

        let start = tokio::time::Instant::now();
        svc.generate_for(&profile("sam")).await.unwrap();
        let waited = start.elapsed();

        assert!(waited >= MAX_RETRY_DELAY);
        assert!(waited < MAX_RETRY_DELAY + Duration::from_secs(1));
        assert_eq!(generator.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn store_only_quiz_needs_no_generator() {
        let store = MemoryStore::new();
        store
            .save_questions("kim", &parse_mcqs_detailed(TWO_QUESTIONS).questions)
            .await
            .unwrap();

        let report = take_quiz(
            &store,
            "kim",
            &[SubmittedAnswer::new("Capital of France?", "PARIS")],
        )
        .await
        .unwrap();

        assert_eq!(report.score, "1 out of 2");
        assert_eq!(store.answers_for("kim").await.unwrap().len(), 1);
    }
}
