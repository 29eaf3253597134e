//! Login screen state

use std::sync::Arc;

use auth::SessionManager;
use auth::validation::{EMAIL, PASSWORD};
use common::error::AppError;
use common::validation::{FormInput, ValidationErrors};

pub struct LoginScreen {
    session: Arc<SessionManager>,
    input: FormInput,
    field_errors: ValidationErrors,
    error: Option<String>,
}

impl LoginScreen {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            input: FormInput::new(),
            field_errors: ValidationErrors::default(),
            error: None,
        }
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.input.set(EMAIL, email);
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.input.set(PASSWORD, password);
    }

    pub fn input(&self) -> &FormInput {
        &self.input
    }

    pub fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sign in with the entered credentials
    ///
    /// The password is cleared after every attempt.
    pub async fn submit(&mut self) -> bool {
        self.field_errors = ValidationErrors::default();
        self.error = None;

        let result = self.session.sign_in(&self.input).await;
        self.input.set(PASSWORD, "");

        match result {
            Ok(_) => true,
            Err(AppError::Validation(errors)) => {
                self.field_errors = errors;
                false
            }
            Err(e) => {
                self.error = Some(e.user_message());
                false
            }
        }
    }
}
