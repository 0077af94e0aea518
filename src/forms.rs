// 📝 Forms - tagged validation outcomes for login, registration and books
//
// Each form either produces a typed value or a field -> message map.
// Numeric input that does not parse is an error, never NaN or zero.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern must compile"));

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const PHONE_DIGITS: usize = 10;
pub const ISBN_DIGITS: usize = 13;

// ============================================================================
// OUTCOME
// ============================================================================

/// Field name -> message, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first message for a field wins
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "lowercase")]
pub enum FormOutcome<T> {
    Valid(T),
    Invalid(FieldErrors),
}

impl<T> FormOutcome<T> {
    fn from_parts(value: Option<T>, errors: FieldErrors) -> Self {
        match value {
            Some(v) if errors.is_empty() => FormOutcome::Valid(v),
            _ => FormOutcome::Invalid(errors),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, FormOutcome::Valid(_))
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            FormOutcome::Valid(_) => None,
            FormOutcome::Invalid(errors) => Some(errors),
        }
    }

    pub fn into_result(self) -> Result<T, FieldErrors> {
        match self {
            FormOutcome::Valid(v) => Ok(v),
            FormOutcome::Invalid(errors) => Err(errors),
        }
    }
}

// ============================================================================
// LOGIN
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> FormOutcome<Credentials> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", "Username is required");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }

        let value = Credentials {
            username: username.to_string(),
            password: self.password.clone(),
        };
        FormOutcome::from_parts(Some(value), errors)
    }
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Payload for the backend's register endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub password: String,
}

impl RegistrationForm {
    /// `username_taken` comes from the availability lookup, when one was made
    pub fn validate(&self, username_taken: bool) -> FormOutcome<Registration> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Full name is required");
        } else if name.chars().count() < MIN_NAME_LEN {
            errors.add("name", "Name must be at least 2 characters");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !EMAIL_PATTERN.is_match(email) {
            errors.add("email", "Invalid email format");
        }

        let phone: String = self.phone.chars().filter(char::is_ascii_digit).collect();
        if self.phone.trim().is_empty() {
            errors.add("phone", "Phone number is required");
        } else if phone.len() != PHONE_DIGITS {
            errors.add("phone", "Phone must be 10 digits");
        }

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", "Username is required");
        } else if username.chars().count() < MIN_USERNAME_LEN {
            errors.add("username", "Username must be at least 3 characters");
        } else if username_taken {
            errors.add("username", "Username is already taken");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 6 characters");
        }

        if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        let value = Registration {
            name: name.to_string(),
            email: email.to_string(),
            phone,
            username: username.to_string(),
            password: self.password.clone(),
        };
        FormOutcome::from_parts(Some(value), errors)
    }
}

// ============================================================================
// BOOK
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub pages: String,
    pub price: String,
    pub category: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub pages: u32,
    pub price: f64,
    pub category: String,
    pub quantity: u32,
}

/// Strip hyphens and spaces; `Some` only for exactly 13 digits
pub fn normalize_isbn13(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != '-' && !c.is_whitespace()).collect();
    let valid = cleaned.len() == ISBN_DIGITS && cleaned.chars().all(|c| c.is_ascii_digit());
    valid.then_some(cleaned)
}

fn required(errors: &mut FieldErrors, field: &str, raw: &str, message: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, message);
        None
    } else {
        Some(value.to_string())
    }
}

fn positive_count(errors: &mut FieldErrors, field: &str, raw: &str, label: &str) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        Ok(_) => {
            errors.add(field, format!("Valid {} is required", label));
            None
        }
        Err(_) if raw.trim().is_empty() => {
            errors.add(field, format!("Valid {} is required", label));
            None
        }
        Err(_) => {
            errors.add(field, format!("{} must be a whole number", capitalize(label)));
            None
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl BookForm {
    pub fn validate(&self) -> FormOutcome<NewBook> {
        let mut errors = FieldErrors::new();

        let title = required(&mut errors, "title", &self.title, "Title is required");
        let author = required(&mut errors, "author", &self.author, "Author is required");
        let pages = positive_count(&mut errors, "pages", &self.pages, "page count");

        let price = match self.price.trim().parse::<f64>() {
            Ok(p) if p.is_finite() && p > 0.0 => Some(p),
            Ok(_) => {
                errors.add("price", "Valid price is required");
                None
            }
            Err(_) if self.price.trim().is_empty() => {
                errors.add("price", "Valid price is required");
                None
            }
            Err(_) => {
                errors.add("price", "Price must be a number");
                None
            }
        };

        let quantity = positive_count(&mut errors, "quantity", &self.quantity, "quantity");

        let isbn = if self.isbn.trim().is_empty() {
            errors.add("isbn", "ISBN is required");
            None
        } else {
            let normalized = normalize_isbn13(&self.isbn);
            if normalized.is_none() {
                errors.add("isbn", "Invalid ISBN-13 format");
            }
            normalized
        };

        let category = required(&mut errors, "category", &self.category, "Category is required");

        let value = match (title, author, isbn, pages, price, category, quantity) {
            (Some(title), Some(author), Some(isbn), Some(pages), Some(price), Some(category), Some(quantity)) => {
                Some(NewBook {
                    title,
                    author,
                    isbn,
                    pages,
                    price,
                    category,
                    quantity,
                })
            }
            _ => None,
        };
        FormOutcome::from_parts(value, errors)
    }
}

// ============================================================================
// TESTS
// ============================================================================
