//! The `upskill init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("upskill.toml").exists() {
        println!("upskill.toml already exists, skipping.");
    } else {
        std::fs::write("upskill.toml", SAMPLE_CONFIG)?;
        println!("Created upskill.toml");
    }

    std::fs::create_dir_all("profiles")?;
    let example_path = Path::new("profiles/example.toml");
    if example_path.exists() {
        println!("profiles/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_PROFILE)?;
        println!("Created profiles/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set UPSKILL_GEMINI_KEY (or edit upskill.toml)");
    println!("  2. Run: upskill generate --profile profiles/example.toml");
    println!("  3. Run: upskill quiz --learner alex --answers answers.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# upskill configuration

default_provider = "gemini"
default_model = "gemini-1.5-pro"
question_count = 3
default_temperature = 0.7
max_retries = 3
retry_delay_ms = 1000
store_path = "./upskill-data/store.json"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

# Offline provider that returns a built-in quiz; use with --model offline/mock-model
[providers.offline]
type = "mock"
"#;

const EXAMPLE_PROFILE: &str = r#"name = "alex"
skill_gaps = ["lifetimes", "trait objects"]

[proficiency]
rust = "beginner"
sql = "intermediate"
"#;
