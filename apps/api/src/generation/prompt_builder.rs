//! Prompt Builder — renders the completion request for one job description.
//!
//! Pure: the same `(GenerationRequest, structured)` pair always renders byte-identical
//! instruction strings.

use crate::errors::AppError;
use crate::generation::prompts::{
    DESCRIPTION_SECTIONS, DESCRIPTION_SYSTEM, FREE_TEXT_FORMAT, JSON_ONLY_SYSTEM,
    STRUCTURED_FORMAT,
};
use crate::llm_client::PromptSpec;

const NO_TOOLS: &str = "none specified";

/// Everything the prompt is rendered from. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    subject_title: String,
    organization_name: String,
    location: Option<String>,
    required_tools: Vec<String>,
    desired_culture: Option<String>,
}

impl GenerationRequest {
    /// Trims every field, drops blank tools and treats blank optionals as absent.
    /// Title and organization must be non-empty.
    pub fn new(
        subject_title: impl Into<String>,
        organization_name: impl Into<String>,
        location: Option<String>,
        required_tools: Vec<String>,
        desired_culture: Option<String>,
    ) -> Result<Self, AppError> {
        let subject_title = subject_title.into().trim().to_string();
        let organization_name = organization_name.into().trim().to_string();

        if subject_title.is_empty() {
            return Err(AppError::Validation("job title cannot be empty".to_string()));
        }
        if organization_name.is_empty() {
            return Err(AppError::Validation(
                "company name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            subject_title,
            organization_name,
            location: non_blank(location),
            required_tools: required_tools
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            desired_culture: non_blank(desired_culture),
        })
    }

    pub fn subject_title(&self) -> &str {
        &self.subject_title
    }

    pub fn organization_name(&self) -> &str {
        &self.organization_name
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn required_tools(&self) -> &[String] {
        &self.required_tools
    }

    pub fn desired_culture(&self) -> Option<&str> {
        self.desired_culture.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Renders the system and user instructions for a description request.
pub fn build_prompt(request: &GenerationRequest, structured: bool) -> PromptSpec {
    let location = request
        .location()
        .map(|l| format!(" in {l}"))
        .unwrap_or_default();

    let tools = if request.required_tools().is_empty() {
        NO_TOOLS.to_string()
    } else {
        request.required_tools().join(", ")
    };

    let mut user = format!(
        "Generate a detailed job description for a {} position at {}{}.\n\
         Required tools and technologies: {}\n",
        request.subject_title(),
        request.organization_name(),
        location,
        tools,
    );

    if let Some(culture) = request.desired_culture() {
        user.push_str(&format!("Company culture to convey: {culture}\n"));
    }

    user.push('\n');
    user.push_str(DESCRIPTION_SECTIONS);
    user.push_str("\n\n");

    let mut system = DESCRIPTION_SYSTEM.to_string();

    if structured {
        system.push(' ');
        system.push_str(JSON_ONLY_SYSTEM);
        user.push_str(STRUCTURED_FORMAT);
    } else {
        user.push_str(FREE_TEXT_FORMAT);
    }

    PromptSpec { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_request() -> GenerationRequest {
        GenerationRequest::new(
            "Backend Engineer",
            "Acme",
            None,
            vec!["Go".to_string(), "Postgres".to_string()],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_free_text_prompt_golden() {
        let prompt = build_prompt(&backend_request(), false);

        let expected_user = format!(
            "Generate a detailed job description for a Backend Engineer position at Acme.\n\
             Required tools and technologies: Go, Postgres\n\
             \n\
             {DESCRIPTION_SECTIONS}\n\
             \n\
             {FREE_TEXT_FORMAT}"
        );
        assert_eq!(prompt.user, expected_user);
        assert_eq!(prompt.system, DESCRIPTION_SYSTEM);
    }

    #[test]
    fn test_structured_prompt_golden() {
        let request = GenerationRequest::new(
            "Data Analyst",
            "Globex",
            Some("Berlin".to_string()),
            vec!["SQL".to_string()],
            Some("Remote-first, async by default".to_string()),
        )
        .unwrap();
        let prompt = build_prompt(&request, true);

        let expected_user = format!(
            "Generate a detailed job description for a Data Analyst position at Globex in Berlin.\n\
             Required tools and technologies: SQL\n\
             Company culture to convey: Remote-first, async by default\n\
             \n\
             {DESCRIPTION_SECTIONS}\n\
             \n\
             {STRUCTURED_FORMAT}"
        );
        assert_eq!(prompt.user, expected_user);
        assert_eq!(prompt.system, format!("{DESCRIPTION_SYSTEM} {JSON_ONLY_SYSTEM}"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let request = backend_request();
        assert_eq!(build_prompt(&request, true), build_prompt(&request, true));
        assert_eq!(build_prompt(&request, false), build_prompt(&request, false));
        assert_ne!(build_prompt(&request, true), build_prompt(&request, false));
    }

    #[test]
    fn test_empty_tools_render_as_none_specified() {
        let request = GenerationRequest::new("QA Lead", "Initech", None, vec![], None).unwrap();
        let prompt = build_prompt(&request, false);
        assert!(prompt
            .user
            .contains("Required tools and technologies: none specified\n"));
    }

    #[test]
    fn test_blank_tools_and_optionals_are_dropped() {
        let request = GenerationRequest::new(
            "  QA Lead ",
            "Initech",
            Some("   ".to_string()),
            vec![" ".to_string(), " Selenium ".to_string()],
            Some(String::new()),
        )
        .unwrap();
        assert_eq!(request.subject_title(), "QA Lead");
        assert_eq!(request.required_tools(), ["Selenium".to_string()]);
        assert!(request.location().is_none());
        assert!(request.desired_culture().is_none());
    }

    #[test]
    fn test_empty_title_or_company_is_rejected() {
        assert!(GenerationRequest::new(" ", "Acme", None, vec![], None).is_err());
        assert!(GenerationRequest::new("Engineer", "", None, vec![], None).is_err());
    }

    #[test]
    fn test_system_prompt_carries_content_rules() {
        let prompt = build_prompt(&backend_request(), false);
        assert!(prompt.system.contains("Never include salary figures"));
        assert!(prompt.system.contains("discriminatory"));
        assert!(prompt.system.contains("specific and measurable"));
    }
}
