//! Collected validation failures

use serde::Serialize;
use std::fmt;

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "has already been taken";
pub const NOT_INCLUDED: &str = "is not included in the list";
pub const OUT_OF_RANGE: &str = "must be between 1 and 65535";

/// Service attribute a validation error is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Port,
    ServiceType,
    Image,
    EnvironmentVariables,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => write!(f, "name"),
            Field::Port => write!(f, "port"),
            Field::ServiceType => write!(f, "service_type"),
            Field::Image => write!(f, "image"),
            Field::EnvironmentVariables => write!(f, "environment_variables"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Every failing check of one validation run, in check order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {}", self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Messages attached to one field
    pub fn on(&self, field: Field) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn contains(&self, field: Field, message: &str) -> bool {
        self.on(field).contains(&message)
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
