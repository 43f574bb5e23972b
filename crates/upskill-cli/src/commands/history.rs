//! The `upskill history` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use upskill_core::store::{JsonFileStore, QuizStore};

pub async fn execute(
    learner: String,
    store: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    use comfy_table::{Cell, Table};

    let store = JsonFileStore::new(super::store_path(store, config_path.as_deref())?);
    let records = store
        .answers_for(&learner)
        .await
        .with_context(|| format!("failed to load history for learner '{learner}'"))?;

    if records.is_empty() {
        println!("No answers recorded for '{learner}'.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Answered", "Question", "Answer", "Correct answer", "Result"]);
    for r in &records {
        table.add_row(vec![
            Cell::new(r.answered_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&r.question_text),
            Cell::new(&r.user_answer_text),
            Cell::new(r.correct_answer_text.as_deref().unwrap_or("N/A")),
            Cell::new(if r.is_correct { "correct" } else { "wrong" }),
        ]);
    }
    println!("{table}");

    let correct = records.iter().filter(|r| r.is_correct).count();
    println!("{correct} of {} recorded answers correct", records.len());

    Ok(())
}
