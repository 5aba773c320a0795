//! Inline field messages for the post form.

use std::collections::BTreeMap;

use blogify_common::{Field, ImageError, ValidationError, error::required_message};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    messages: BTreeMap<Field, String>,
}

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.messages.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        self.messages.insert(field, message.into());
    }

    pub fn clear(&mut self, field: Field) {
        self.messages.remove(&field);
    }

    pub fn clear_all(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Fields that currently carry a message, in form order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.messages.keys().copied()
    }

    /// Replace the title and content messages with those of `result`.
    pub fn record_validation(&mut self, result: &Result<(), ValidationError>) {
        self.clear(Field::Title);
        self.clear(Field::Content);
        if let Err(ValidationError::MissingFields { fields }) = result {
            for field in fields {
                self.set(*field, required_message(*field));
            }
        }
    }

    pub fn record_image(&mut self, error: &ImageError) {
        self.set(Field::Image, error.user_message());
    }
}
