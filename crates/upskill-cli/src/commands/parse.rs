//! The `upskill parse` command.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

use upskill_core::model::OptionLetter;
use upskill_core::parser::parse_mcqs_detailed;

pub fn execute(input: PathBuf, format: String) -> Result<()> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(&input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };

    let outcome = parse_mcqs_detailed(&raw);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&outcome.questions)?);
        }
        "text" => {
            for (i, q) in outcome.questions.iter().enumerate() {
                println!("{}. {}", i + 1, q.question_text);
                for letter in OptionLetter::ALL {
                    println!("   {letter}. {}", q.option(letter));
                }
                println!("   Answer: {}", q.correct_answer_text);
                println!();
            }
            println!("Parsed {} question(s)", outcome.questions.len());
        }
        other => anyhow::bail!("unknown format '{other}' (expected text or json)"),
    }

    if outcome.skipped > 0 {
        eprintln!("Skipped {} malformed block(s)", outcome.skipped);
    }

    Ok(())
}
