//! Login form validation

use std::fmt;

use common::validation::{FieldRule, FormInput, Schema, ValidationErrors};

pub const EMAIL: &str = "email";
pub const PASSWORD: &str = "password";

/// Schema of the login form
pub fn login_schema() -> Schema {
    Schema::new()
        .field(FieldRule::email(EMAIL).label("Email").required())
        .field(
            FieldRule::text(PASSWORD)
                .label("Password")
                .required()
                .min(6.0),
        )
}

/// Validated sign-in credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Validate a login form
    pub fn from_form(input: &FormInput) -> Result<Self, ValidationErrors> {
        let record = login_schema().validate(input)?;
        Ok(Self {
            email: record.text(EMAIL).unwrap_or_default().to_string(),
            password: record.text(PASSWORD).unwrap_or_default().to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
