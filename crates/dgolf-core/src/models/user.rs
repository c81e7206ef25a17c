use serde::{Deserialize, Serialize};

/// User account as returned by `/api/auth/me` and inside auth responses.
/// The backend strips sensitive fields before serializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub preferences: UserPreferences,
}

/// Travel preferences attached to a profile. Tier scoring over these fields
/// happens server-side; the client only displays the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub budget_min: i64,
    #[serde(default)]
    pub budget_max: i64,
    #[serde(default)]
    pub preferred_countries: Vec<String>,
    pub playing_level: Option<String>,
    pub accommodation_preference: Option<String>,
    pub trip_duration_days: Option<i32>,
    pub group_size: Option<i32>,
    pub phone_number: Option<String>,
    pub travel_frequency: Option<String>,
    #[serde(default)]
    pub preferred_travel_months: Vec<String>,
    pub handicap: Option<i32>,
}

/// Response body of `/api/auth/login` and `/api/auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_parses_without_optional_fields() {
        let json = r#"{
            "id": "u-1",
            "email": "pelle@example.se",
            "full_name": "Pelle Larsson"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.preferences.preferred_countries.len(), 0);
    }

    #[test]
    fn test_token_response_parses() {
        let json = r#"{
            "access_token": "abc",
            "token_type": "bearer",
            "user": {"id": "u-1", "email": "a@b.se", "full_name": "A B", "is_admin": true}
        }"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "abc");
        assert!(resp.user.is_admin);
    }
}
