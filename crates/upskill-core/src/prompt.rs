//! Prompt construction for question generation.

use crate::model::LearnerProfile;

/// Number of questions requested when the caller does not say otherwise.
pub const DEFAULT_QUESTION_COUNT: usize = 3;

/// System prompt sent with every generation request.
pub const SYSTEM_PROMPT: &str = "You are an intelligent educational assistant that writes multiple choice questions. Respond only with questions in the requested format. Do not add explanations.";

/// Build the generation prompt for a learner.
pub fn build_prompt(profile: &LearnerProfile, question_count: usize) -> String {
    let skill_gaps = if profile.skill_gaps.is_empty() {
        "none listed".to_string()
    } else {
        profile.skill_gaps.join(", ")
    };

    let proficiency = if profile.proficiency.is_empty() {
        "none listed".to_string()
    } else {
        profile
            .proficiency
            .iter()
            .map(|(skill, level)| format!("{skill}: {level}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Generate {question_count} multiple choice questions (MCQs) based on the following \
learner's skill gaps and proficiency levels.

Skill gaps: {skill_gaps}
Proficiency levels: {proficiency}

Format the questions exactly like this:

1. [question]
A. option1
B. option2
C. option3
D. option4
Answer: [A/B/C/D]

Only return questions in that format. No extra explanation.
"
    )
}
