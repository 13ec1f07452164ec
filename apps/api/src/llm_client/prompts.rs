// Prompt constants and builders for categorization and CV/JD matching.
// Both prompts cap each input text at PROMPT_CHAR_LIMIT characters.

use crate::models::document::{Category, DocKind};

/// Maximum characters of any single document included in a prompt.
pub const PROMPT_CHAR_LIMIT: usize = 3000;

pub const CATEGORIZE_SYSTEM: &str = "You are an expert HR categorization assistant.";

/// Replace `{doc_kind}`, `{categories}` and `{text}` before sending.
const CATEGORIZE_PROMPT_TEMPLATE: &str = "Analyze the following {doc_kind} and categorize it into ONE of these categories:
{categories}

{doc_kind} Content:
{text}

Respond with ONLY the category name, nothing else.";

pub const MATCH_SYSTEM: &str = "You are an expert HR recruiter performing detailed CV-JD matching analysis. \
    Always provide thorough, evidence-based assessments in valid JSON format.";

/// Replace `{jd_text}` and `{cv_text}` before sending.
const MATCH_PROMPT_TEMPLATE: &str = r#"You are an expert HR recruiter with 20+ years of experience in talent acquisition. Perform a comprehensive analysis of how well this candidate's CV matches the Job Description.

JOB DESCRIPTION:
{jd_text}

CANDIDATE CV:
{cv_text}

ANALYSIS INSTRUCTIONS:
1. Carefully evaluate the candidate's skills, experience, education, and achievements against the job requirements
2. Consider both hard skills (technical abilities, certifications) and soft skills (leadership, communication)
3. Assess years of experience, industry relevance, and career progression
4. Identify specific matching points with concrete examples from the CV
5. Note any gaps or missing qualifications that are critical for the role
6. Provide an honest, objective assessment with a numerical score

Provide your analysis in the following JSON format:
{
    "score": <number between 0-100, where:
        90-100 = Exceptional match, highly recommended
        75-89 = Strong match, recommended
        60-74 = Good match, consider for interview
        40-59 = Fair match, has potential but gaps exist
        0-39 = Poor match, significant gaps>,
    "match_level": "<Excellent/Good/Fair/Poor>",
    "key_matches": [
        "Specific skill or experience that matches (with evidence from CV)",
        "Another matching qualification (with evidence)"
    ],
    "gaps": [
        "Specific missing requirement or skill gap",
        "Another gap or concern"
    ],
    "summary": "A detailed 3-4 sentence professional assessment explaining why this score was given, the strongest qualifications, the most critical gaps, and your recommendation"
}

Respond with ONLY valid JSON, no additional text."#;

/// Returns at most `limit` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn build_categorize_prompt(text: &str, kind: DocKind) -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| format!("- {}", c.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    let doc_kind = kind.as_str().to_uppercase();

    fill_template(
        CATEGORIZE_PROMPT_TEMPLATE,
        &[
            ("categories", categories.as_str()),
            ("doc_kind", doc_kind.as_str()),
            ("text", truncate_chars(text, PROMPT_CHAR_LIMIT)),
        ],
    )
}

pub fn build_match_prompt(cv_text: &str, jd_text: &str) -> String {
    fill_template(
        MATCH_PROMPT_TEMPLATE,
        &[
            ("jd_text", truncate_chars(jd_text, PROMPT_CHAR_LIMIT)),
            ("cv_text", truncate_chars(cv_text, PROMPT_CHAR_LIMIT)),
        ],
    )
}

/// Substitutes `{key}` placeholders in one left-to-right pass. Inserted values
/// are never scanned again; unknown braces are copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}
