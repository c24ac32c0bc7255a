pub mod application;
pub mod company;
pub mod job_posting;

/// Upper bound on `limit` for list endpoints.
pub const MAX_PAGE_SIZE: i64 = 1000;

fn default_limit() -> i64 {
    100
}

/// `skip` / `limit` query parameters shared by the list endpoints.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Page {
    /// Negative values are treated as zero; `limit` is capped at `MAX_PAGE_SIZE`.
    pub fn clamped(self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(0, MAX_PAGE_SIZE))
    }
}

/// Rejects empty or whitespace-only strings for a required field.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), crate::errors::AppError> {
    if value.trim().is_empty() {
        return Err(crate::errors::AppError::Validation(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let page: Page = serde_json::from_str("{}").unwrap();
        assert_eq!(page.clamped(), (0, 100));
    }

    #[test]
    fn test_page_clamps_out_of_range_values() {
        let page = Page {
            skip: -5,
            limit: 50_000,
        };
        assert_eq!(page.clamped(), (0, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_require_non_blank() {
        assert!(require_non_blank("name", "Acme").is_ok());
        assert!(require_non_blank("name", "   ").is_err());
    }
}
