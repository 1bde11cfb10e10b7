//! Purchase Form
//!
//! The only user input in the shop: how many units to buy.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Name of the quantity field in submitted form data
pub const QUANTITY_FIELD: &str = "quantity";

/// Smallest quantity a buyer may order
pub const MIN_QUANTITY: u32 = 1;

/// Largest quantity a buyer may order
pub const MAX_QUANTITY: u32 = 10;

/// Value shown in an unbound form
pub const INITIAL_QUANTITY: u32 = 1;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_INTEGER_MESSAGE: &str = "Enter a whole number.";

/// Field-level validation errors, keyed by field name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }
    
    /// Messages for one field (empty if the field is valid)
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
    
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The purchase form, bound or unbound
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PurchaseForm {
    quantity: Option<String>,
    bound: bool,
}

impl PurchaseForm {
    /// Empty form, as rendered on the home page
    pub fn unbound() -> Self {
        Self::default()
    }
    
    /// Form bound to submitted data
    pub fn bind(data: &HashMap<String, String>) -> Self {
        Self {
            quantity: data.get(QUANTITY_FIELD).cloned(),
            bound: true,
        }
    }
    
    pub fn is_bound(&self) -> bool {
        self.bound
    }
    
    /// Value to pre-fill the quantity input with
    pub fn quantity_value(&self) -> String {
        if self.bound {
            self.quantity.clone().unwrap_or_default()
        } else {
            INITIAL_QUANTITY.to_string()
        }
    }
    
    /// Validate the bound data, yielding the cleaned quantity
    pub fn validate(&self) -> Result<u32, FieldErrors> {
        let mut errors = FieldErrors::default();
        
        if !self.bound {
            errors.add(QUANTITY_FIELD, REQUIRED_MESSAGE);
            return Err(errors);
        }
        
        let raw = self.quantity.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            errors.add(QUANTITY_FIELD, REQUIRED_MESSAGE);
            return Err(errors);
        }
        
        let Ok(quantity) = raw.parse::<i64>() else {
            errors.add(QUANTITY_FIELD, INVALID_INTEGER_MESSAGE);
            return Err(errors);
        };
        
        if quantity < i64::from(MIN_QUANTITY) {
            errors.add(
                QUANTITY_FIELD,
                format!("Ensure this value is greater than or equal to {MIN_QUANTITY}."),
            );
        } else if quantity > i64::from(MAX_QUANTITY) {
            errors.add(
                QUANTITY_FIELD,
                format!("Ensure this value is less than or equal to {MAX_QUANTITY}."),
            );
        }
        
        if !errors.is_empty() {
            return Err(errors);
        }
        
        u32::try_from(quantity).map_err(|_| {
            let mut errors = FieldErrors::default();
            errors.add(QUANTITY_FIELD, INVALID_INTEGER_MESSAGE);
            errors
        })
    }
}
