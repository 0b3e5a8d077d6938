// ABOUTME: Ingredient drafts produced by scanning or manual entry, and durable pantry items
// ABOUTME: Field validation shared by review edits, batch commits and manual additions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Editable, not-yet-persisted ingredient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDraft {
    /// Ingredient name
    pub name: String,
    /// Free-form quantity ("500g", "2 cups"); empty means the user must supply one
    pub quantity: String,
    /// Recognition confidence in [0, 1]; `None` for manual entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl IngredientDraft {
    /// Draft entered by hand
    pub fn manual(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            confidence: None,
        }
    }

    /// Draft produced by the recognition service; confidence is clamped to [0, 1]
    /// and non-finite scores are dropped
    pub fn recognized(
        name: impl Into<String>,
        quantity: impl Into<String>,
        confidence: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            confidence: confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0)),
        }
    }

    /// Whether the draft came from recognition
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        self.confidence.is_some()
    }

    /// Confidence as a rounded percentage for display
    #[must_use]
    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence.map(|c| (c * 100.0).round() as u8)
    }

    /// Check both fields are non-empty after trimming
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first empty field
    pub fn validate(&self) -> AppResult<()> {
        validate_fields(&self.name, &self.quantity).map(|_| ())
    }

    /// Convert into the durable pantry form, trimming both fields
    ///
    /// # Errors
    ///
    /// Returns a validation error if either field is blank
    pub fn to_pantry_item(&self) -> AppResult<PantryItem> {
        PantryItem::new(&self.name, &self.quantity)
    }
}

/// Durable pantry record written by the commit coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PantryItem {
    /// Ingredient name
    pub name: String,
    /// Free-form quantity
    pub quantity: String,
}

impl PantryItem {
    /// Build a validated, trimmed pantry item
    ///
    /// # Errors
    ///
    /// Returns a validation error if either field is blank
    pub fn new(name: &str, quantity: &str) -> AppResult<Self> {
        let (name, quantity) = validate_fields(name, quantity)?;
        Ok(Self {
            name: name.to_owned(),
            quantity: quantity.to_owned(),
        })
    }
}

/// Trim and require both ingredient fields
///
/// # Errors
///
/// Returns a validation error naming the first blank field
pub fn validate_fields<'a>(name: &'a str, quantity: &'a str) -> AppResult<(&'a str, &'a str)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name", "Ingredient name must not be empty"));
    }
    let quantity = quantity.trim();
    if quantity.is_empty() {
        return Err(AppError::validation(
            "quantity",
            format!("Quantity for '{name}' must not be empty"),
        ));
    }
    Ok((name, quantity))
}
