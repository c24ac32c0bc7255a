use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub industry: Option<String>,
    pub url: Option<String>,
    pub headcount: Option<i32>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    #[sqlx(rename = "isPublic")]
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub industry: Option<String>,
    pub url: Option<String>,
    pub headcount: Option<i32>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "isPublic", default)]
    pub is_public: bool,
}

/// Partial update: only fields present in the body are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub url: Option<String>,
    pub headcount: Option<i32>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CompanyFilter {
    pub industry: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_company_uses_camel_case_public_flag() {
        let company: NewCompany =
            serde_json::from_str(r#"{"name": "Acme", "isPublic": true}"#).unwrap();
        assert!(company.is_public);
        assert!(company.industry.is_none());
    }

    #[test]
    fn test_new_company_public_flag_defaults_to_false() {
        let company: NewCompany = serde_json::from_str(r#"{"name": "Acme"}"#).unwrap();
        assert!(!company.is_public);
    }

    #[test]
    fn test_company_serializes_public_flag_as_is_public() {
        let company = Company {
            id: 1,
            name: "Acme".to_string(),
            industry: None,
            url: None,
            headcount: Some(40),
            country: None,
            state: None,
            city: None,
            is_public: Some(false),
        };
        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value["isPublic"], false);
        assert_eq!(value["headcount"], 40);
    }
}
