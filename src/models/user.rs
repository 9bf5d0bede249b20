use crate::constants::MAX_NAME_LEN;
use crate::models::check_name;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Body of `POST /users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default, alias = "userID")]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), String> {
        check_name("user_id", &self.user_id, MAX_NAME_LEN)?;
        validate_profile(&self.name, &self.email)
    }

    pub fn normalized(mut self) -> Self {
        self.user_id = self.user_id.trim().to_string();
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }
}

/// Body of `PUT /users/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), String> {
        validate_profile(&self.name, &self.email)
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_profile(name: &str, email: &str) -> Result<(), String> {
    check_name("name", name, MAX_NAME_LEN)?;

    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err("email must look like name@domain".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_user_accepts_legacy_id_field() {
        let user: NewUser = serde_json::from_value(json!({
            "userID": "u42",
            "name": "Ravi",
            "email": "Ravi@Example.com "
        }))
        .unwrap();
        assert!(user.validate().is_ok());

        let user = user.normalized();
        assert_eq!(user.user_id, "u42");
        assert_eq!(user.email, "ravi@example.com");
    }

    #[test]
    fn test_email_validation() {
        for email in ["a@b", "first.last@example.org"] {
            assert!(validate_profile("A", email).is_ok(), "{email}");
        }
        for email in ["", "no-at-sign", "@domain", "local@", "a@b@c", "a b@c"] {
            assert!(validate_profile("A", email).is_err(), "{email}");
        }
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert!(NewUser::default().validate().is_err());
        assert!(UserUpdate {
            name: "".to_string(),
            email: "a@b".to_string()
        }
        .validate()
        .is_err());
    }
}
