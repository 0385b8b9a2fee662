// src/validation.rs
use crate::errors::CarscanError;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormField::FirstName => "firstName",
            FormField::LastName => "lastName",
            FormField::Email => "email",
            FormField::Password => "password",
            FormField::ConfirmPassword => "confirmPassword",
        };
        f.write_str(name)
    }
}

/// Per-field messages collected from one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<FormField, String>,
}

impl FormErrors {
    pub fn add(&mut self, field: FormField, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Rejects a blank user id before anything touches the network.
pub fn validate_user_id(user_id: &str) -> Result<(), CarscanError> {
    if user_id.trim().is_empty() {
        return Err(CarscanError::Validation("user id must not be empty".to_string()));
    }
    Ok(())
}

fn check_email(errors: &mut FormErrors, email: &str) {
    if email.is_empty() {
        errors.add(FormField::Email, "Email is required");
    } else if !is_valid_email(email) {
        errors.add(FormField::Email, "Please enter a valid email");
    }
}

fn check_password(errors: &mut FormErrors, password: &str) {
    if password.is_empty() {
        errors.add(FormField::Password, "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            FormField::Password,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
}

pub fn validate_email(email: &str) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    check_email(&mut errors, email);
    errors.into_result()
}

pub fn validate_login(email: &str, password: &str) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    errors.into_result()
}

pub fn validate_registration(form: &RegistrationForm) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();

    if form.first_name.is_empty() {
        errors.add(FormField::FirstName, "First name is required");
    }
    if form.last_name.is_empty() {
        errors.add(FormField::LastName, "Last name is required");
    }
    check_email(&mut errors, &form.email);
    check_password(&mut errors, &form.password);
    if form.password != form.confirm_password {
        errors.add(FormField::ConfirmPassword, "Passwords do not match");
    }

    errors.into_result()
}
