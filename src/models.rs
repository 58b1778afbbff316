// ABOUTME: Common data models for users and clients plus formatting helpers
// ABOUTME: View structs define the wire shapes returned inside envelopes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account stored in an identity store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier
    pub id: Uuid,
    /// Unique email, also used as the default username
    pub email: String,
    /// Unique username
    pub username: String,
    /// Display name
    pub full_name: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional profile image URL
    pub profile_image_url: Option<String>,
    /// Bcrypt password hash; empty for external-login-only accounts
    pub password_hash: String,
    /// Whether the account is active
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last successful login, if any
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new active account with the email doubling as username
    #[must_use]
    pub fn new(email: String, full_name: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: email.clone(),
            email,
            full_name,
            phone: None,
            profile_image_url: None,
            password_hash,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

/// Requested profile state for user create/edit operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Target user id; absent on create
    pub id: Option<Uuid>,
    /// Display name
    pub full_name: String,
    /// Email
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional profile image URL
    pub profile_image_url: Option<String>,
    /// Requested role set
    pub roles: Vec<String>,
    /// Requested permission policy set
    pub policies: Vec<String>,
}

/// User shape returned inside envelopes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Option<Uuid>,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<String>>,
}

impl UserView {
    /// Minimal view: id and email only
    #[must_use]
    pub fn brief(id: Uuid, email: &str) -> Self {
        Self {
            id: Some(id),
            email: Some(email.to_owned()),
            ..Self::default()
        }
    }

    /// Listing view with profile fields
    #[must_use]
    pub fn listing(user: &User) -> Self {
        Self {
            id: Some(user.id),
            email: Some(user.email.clone()),
            full_name: Some(user.full_name.clone()),
            profile_image_url: user.profile_image_url.clone(),
            roles: None,
            policies: None,
        }
    }
}

/// Successful login result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub full_name: String,
    pub email: String,
    pub token: String,
}

/// The current user's roles and policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccessView {
    pub roles: Vec<String>,
    pub policies: Vec<String>,
}

/// Client entity stored per tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Stable client identifier
    pub id: Uuid,
    /// Display name, at most 100 characters
    pub full_name: String,
    /// CPF/CNPJ, stored formatted
    pub document_number: String,
    /// Contact email
    pub email: String,
    /// Optional phone, stored formatted
    pub phone: Option<String>,
    /// Optional zip code, stored formatted
    pub zip_code: Option<String>,
    /// Whether the client has paid
    pub paid: bool,
    /// Soft-delete flag
    pub is_active: bool,
    /// When the client was created
    pub created_at: DateTime<Utc>,
    /// When the client was last updated
    pub updated_at: DateTime<Utc>,
}

/// Client shape returned inside envelopes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub id: Uuid,
    pub full_name: String,
    pub document_number: String,
    pub email: String,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    pub paid: bool,
}

impl From<&Client> for ClientView {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id,
            full_name: client.full_name.clone(),
            document_number: client.document_number.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            zip_code: client.zip_code.clone(),
            paid: client.paid,
        }
    }
}

/// Strip every non-digit character
#[must_use]
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Format a document number as CPF (11 digits) or CNPJ (14 digits);
/// other lengths pass through digits-only
#[must_use]
pub fn format_document(value: &str) -> String {
    let digits = digits_only(value);
    match digits.len() {
        11 => format!(
            "{}.{}.{}-{}",
            &digits[0..3],
            &digits[3..6],
            &digits[6..9],
            &digits[9..11]
        ),
        14 => format!(
            "{}.{}.{}/{}-{}",
            &digits[0..2],
            &digits[2..5],
            &digits[5..8],
            &digits[8..12],
            &digits[12..14]
        ),
        _ => digits,
    }
}

/// Format a Brazilian phone number as (xx) xxxxx-xxxx / (xx) xxxx-xxxx
#[must_use]
pub fn format_phone(value: &str) -> String {
    let digits = digits_only(value);
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[0..2], &digits[2..7], &digits[7..11]),
        10 => format!("({}) {}-{}", &digits[0..2], &digits[2..6], &digits[6..10]),
        _ => digits,
    }
}

/// Format a zip code as xxxxx-xxx
#[must_use]
pub fn format_zip_code(value: &str) -> String {
    let digits = digits_only(value);
    if digits.len() == 8 {
        format!("{}-{}", &digits[0..5], &digits[5..8])
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_document_cpf_and_cnpj() {
        assert_eq!(format_document("52998224725"), "529.982.247-25");
        assert_eq!(format_document("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format_document("123"), "123");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
    }

    #[test]
    fn test_format_zip_code() {
        assert_eq!(format_zip_code("01310100"), "01310-100");
        assert_eq!(format_zip_code("0131010"), "0131010");
    }

    #[test]
    fn test_digits_only_strips_punctuation() {
        assert_eq!(digits_only("529.982.247-25"), "52998224725");
    }
}
