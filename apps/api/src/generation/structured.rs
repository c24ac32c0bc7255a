//! Structured Output Parser — turns accumulated generated text into a `StructuredDescription`
//! and renders it back to the persisted Markdown form.
//!
//! A parse failure is never fatal: the pipeline persists the raw text instead.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in generated text")]
    NoPayload,

    #[error("generated JSON does not match the description schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("field `{0}` needs at least one entry")]
    EmptyList(&'static str),

    #[error("field `{0}` contains a blank entry")]
    BlankEntry(&'static str),
}

/// A job description in the fixed schema the model is asked to emit.
/// Only ever produced whole, by a successful `parse_structured`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDescription {
    pub title: String,
    pub overview: String,
    pub responsibilities: Vec<String>,
    #[serde(alias = "requiredSkills")]
    pub required_skills: Vec<String>,
    pub qualifications: Vec<String>,
    pub benefits: Vec<String>,
    #[serde(default, alias = "companyCulture")]
    pub company_culture: Option<String>,
}

/// Parses and validates the model output. Tolerates Markdown code fences and stray
/// prose around the JSON object; anything else that deviates from the schema fails.
pub fn parse_structured(full_text: &str) -> Result<StructuredDescription, ParseError> {
    let payload = extract_json_payload(full_text).ok_or(ParseError::NoPayload)?;
    let mut description: StructuredDescription = serde_json::from_str(payload)?;

    description.title = description.title.trim().to_string();
    description.overview = description.overview.trim().to_string();
    description.company_culture = description
        .company_culture
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    if description.title.is_empty() {
        return Err(ParseError::EmptyField("title"));
    }
    if description.overview.is_empty() {
        return Err(ParseError::EmptyField("overview"));
    }

    validate_list("responsibilities", &mut description.responsibilities)?;
    validate_list("required_skills", &mut description.required_skills)?;
    validate_list("qualifications", &mut description.qualifications)?;
    validate_list("benefits", &mut description.benefits)?;

    Ok(description)
}

fn validate_list(field: &'static str, items: &mut [String]) -> Result<(), ParseError> {
    if items.is_empty() {
        return Err(ParseError::EmptyList(field));
    }
    for item in items.iter_mut() {
        *item = item.trim().to_string();
        if item.is_empty() {
            return Err(ParseError::BlankEntry(field));
        }
    }
    Ok(())
}

fn extract_json_payload(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let unfenced = strip_json_fences(trimmed);

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    (start < end).then_some(&unfenced[start..=end])
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let stripped = stripped.trim_start();
    stripped
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(stripped)
}

/// Renders the persisted Markdown form. Section order is fixed:
/// Title, Overview, Responsibilities, Required Skills, Qualifications, Benefits,
/// Company Culture (omitted when absent).
pub fn render_description(description: &StructuredDescription) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = write!(out, "# {}\n\n## Overview\n{}\n", description.title, description.overview);
    render_list(&mut out, "Responsibilities", &description.responsibilities);
    render_list(&mut out, "Required Skills", &description.required_skills);
    render_list(&mut out, "Qualifications", &description.qualifications);
    render_list(&mut out, "Benefits", &description.benefits);

    if let Some(culture) = &description.company_culture {
        let _ = write!(out, "\n## Company Culture\n{culture}\n");
    }

    out.truncate(out.trim_end().len());
    out
}

fn render_list(out: &mut String, heading: &str, items: &[String]) {
    let _ = write!(out, "\n## {heading}\n");
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}
