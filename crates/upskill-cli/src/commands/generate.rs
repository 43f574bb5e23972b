//! The `upskill generate` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use upskill_core::model::LearnerProfile;
use upskill_core::service::QuizService;
use upskill_core::store::JsonFileStore;
use upskill_providers::config::load_config_from;
use upskill_providers::create_provider;

pub async fn execute(
    profile_path: PathBuf,
    count: Option<usize>,
    model: Option<String>,
    store: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let profile = load_profile(&profile_path)?;

    let (provider_name, model_id) = config.resolve_model(model.as_deref());
    let provider_config = config.providers.get(&provider_name).ok_or_else(|| {
        anyhow::anyhow!(
            "provider '{}' not found in config. Available: {:?}",
            provider_name,
            config.providers.keys().collect::<Vec<_>>()
        )
    })?;
    let provider = create_provider(&provider_name, provider_config)?;

    let mut service_config = config.service_config(&model_id);
    if let Some(n) = count {
        anyhow::ensure!(n >= 1, "--count must be at least 1");
        service_config.question_count = n;
    }

    let store_path = store.unwrap_or_else(|| config.store_path.clone());
    let store = Arc::new(JsonFileStore::new(store_path));

    eprintln!(
        "Generating {} question(s) for '{}' with {}/{}",
        service_config.question_count, profile.name, provider_name, model_id
    );

    let service = QuizService::new(Arc::from(provider), store.clone(), service_config);
    let outcome = service.generate_for(&profile).await?;

    for (i, q) in outcome.questions.iter().enumerate() {
        println!("{}. {}", i + 1, q.question_text);
        println!("{}", indent(&q.options_listing()));
        println!();
    }

    println!(
        "Stored {} question(s) for '{}' in {}",
        outcome.questions.len(),
        profile.name,
        store.path().display()
    );
    if outcome.skipped > 0 {
        eprintln!("Skipped {} malformed block(s)", outcome.skipped);
    }

    Ok(())
}

fn load_profile(path: &Path) -> Result<LearnerProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile: {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let profile = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse profile: {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse profile: {}", path.display()))?
    };
    Ok(profile)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("   {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_from_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("p.json");
        std::fs::write(&json, r#"{"name": "sam", "skill_gaps": ["sql"]}"#).unwrap();
        let profile = load_profile(&json).unwrap();
        assert_eq!(profile.name, "sam");
        assert!(profile.proficiency.is_empty());

        let toml_path = dir.path().join("p.toml");
        std::fs::write(&toml_path, "name = \"kim\"\n").unwrap();
        assert_eq!(load_profile(&toml_path).unwrap().name, "kim");
    }

    #[test]
    fn indent_prefixes_each_line() {
        assert_eq!(indent("A) x\nB) y"), "   A) x\n   B) y");
    }
}
