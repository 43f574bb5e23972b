//! The `upskill quiz` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use upskill_core::model::SubmittedAnswer;
use upskill_core::report::QuizReport;
use upskill_core::service::take_quiz;
use upskill_core::store::JsonFileStore;

pub async fn execute(
    learner: String,
    answers_path: PathBuf,
    store: Option<PathBuf>,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json" | "markdown" | "md"),
        "unknown format '{format}' (expected text, json or markdown)"
    );

    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let answers: Vec<SubmittedAnswer> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", answers_path.display()))?;

    let store = JsonFileStore::new(super::store_path(store, config_path.as_deref())?);
    let report = take_quiz(&store, &learner, &answers).await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_text(&report),
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_text(report: &QuizReport) {
    use comfy_table::{Cell, Table};

    println!("Score: {}", report.score);
    if report.detailed_results.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer", "Status"]);
    for r in &report.detailed_results {
        table.add_row(vec![
            Cell::new(r.position),
            Cell::new(&r.question),
            Cell::new(&r.your_answer),
            Cell::new(&r.status),
        ]);
    }

    println!("{table}");
}
