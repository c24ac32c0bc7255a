use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: i32,
    /// Nullable in the stored schema; new postings always carry one.
    pub title: Option<String>,
    pub company_id: i32,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary_range: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJobPosting {
    pub company_id: i32,
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary_range: Option<String>,
}

/// Partial update: only fields present in the body are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPostingUpdate {
    pub company_id: Option<i32>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary_range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobPostingFilter {
    pub company_id: Option<i32>,
    /// Case-insensitive substring match.
    pub title: Option<String>,
    /// Case-insensitive substring match.
    pub location: Option<String>,
}
