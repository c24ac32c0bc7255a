use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;
use crate::models::require_non_blank;

pub const DEFAULT_STATUS: &str = "Pending";

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i32,
    pub job_id: i32,
    pub candidate_id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub job_id: i32,
    pub candidate_id: String,
    pub name: String,
    pub email: String,
    #[serde(default = "default_status")]
    pub status: String,
}

impl NewApplication {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("candidate_id", &self.candidate_id)?;
        require_non_blank("name", &self.name)?;
        require_non_blank("status", &self.status)?;
        validate_email(&self.email)
    }
}

/// Partial update: only fields present in the body are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationUpdate {
    pub job_id: Option<i32>,
    pub candidate_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
}

impl ApplicationUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        match &self.email {
            Some(email) => validate_email(email),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationFilter {
    pub job_id: Option<i32>,
    pub candidate_id: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
}

/// Shape check only: one `@` with something on both sides and no whitespace.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "email {email:?} is not a valid address"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_pending() {
        let app: NewApplication = serde_json::from_value(serde_json::json!({
            "job_id": 3,
            "candidate_id": "cand-1",
            "name": "Ada Lovelace",
            "email": "ada@example.com"
        }))
        .unwrap();
        assert_eq!(app.status, "Pending");
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_validate_email_shapes() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@").is_err());
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_email("ada lovelace@example.com").is_err());
    }

    #[test]
    fn test_update_validates_email_only_when_present() {
        assert!(ApplicationUpdate::default().validate().is_ok());
        let update = ApplicationUpdate {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let app = NewApplication {
            job_id: 1,
            candidate_id: "c".to_string(),
            name: "  ".to_string(),
            email: "a@b.io".to_string(),
            status: DEFAULT_STATUS.to_string(),
        };
        assert!(app.validate().is_err());
    }
}
