//! Quote requests submitted from product pages

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const MAX_DESCRIPTION_CHARS: usize = 500;

static EMAIL_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

static PHONE_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,15}$"));

fn is_match(pattern: &Lazy<Result<Regex, regex::Error>>, value: &str) -> bool {
    pattern.as_ref().is_ok_and(|re| re.is_match(value))
}

/// Raw form input, exactly as typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuoteRequestDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub product_name: String,
    pub quantity: i64,
    pub description: String,
    pub delivery_date: Option<NaiveDate>,
}

impl Default for QuoteRequestDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            product_name: String::new(),
            quantity: 1,
            description: String::new(),
            delivery_date: None,
        }
    }
}

impl QuoteRequestDraft {
    /// Pre-filled draft for the "request a quote" button on a product page.
    pub fn for_product(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            ..Self::default()
        }
    }

    /// Check every field and collect all violations. `today` is the
    /// earliest acceptable delivery date.
    pub fn validate(&self, today: NaiveDate) -> Result<QuoteRequest, QuoteValidationErrors> {
        let mut errors = QuoteValidationErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(QuoteField::Name, "Name is required");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(QuoteField::Email, "Email is required");
        } else if !is_match(&EMAIL_PATTERN, email) {
            errors.push(QuoteField::Email, "Invalid email");
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.push(QuoteField::Phone, "Phone number is required");
        } else if !is_match(&PHONE_PATTERN, phone) {
            errors.push(QuoteField::Phone, "Please enter a valid phone number");
        }

        let product_name = self.product_name.trim();
        if product_name.is_empty() {
            errors.push(QuoteField::ProductName, "Product name is required");
        }

        let quantity = match u32::try_from(self.quantity) {
            Ok(q) if q > 0 => q,
            _ => {
                errors.push(QuoteField::Quantity, "Quantity must be positive");
                0
            }
        };

        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            errors.push(QuoteField::Description, "Description too long");
        }

        match self.delivery_date {
            None => errors.push(QuoteField::DeliveryDate, "Delivery date is required"),
            Some(date) if date < today => {
                errors.push(QuoteField::DeliveryDate, "Delivery date cannot be in the past")
            }
            Some(_) => {}
        }

        match (errors.is_empty(), self.delivery_date) {
            (true, Some(delivery_date)) => Ok(QuoteRequest {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                product_name: product_name.to_string(),
                quantity,
                description: self.description.trim().to_string(),
                delivery_date,
            }),
            _ => Err(errors),
        }
    }
}

/// A draft that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub product_name: String,
    pub quantity: u32,
    pub description: String,
    pub delivery_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum QuoteField {
    Name,
    Email,
    Phone,
    ProductName,
    Quantity,
    Description,
    DeliveryDate,
}

/// Field -> message, one message per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteValidationErrors {
    pub fields: BTreeMap<QuoteField, String>,
}

impl QuoteValidationErrors {
    fn push(&mut self, field: QuoteField, message: &str) {
        self.fields.entry(field).or_insert_with(|| message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: QuoteField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

impl fmt::Display for QuoteValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.fields.values().map(String::as_str).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for QuoteValidationErrors {}
