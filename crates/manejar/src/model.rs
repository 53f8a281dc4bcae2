//! Form model value types.
//!
//! A form model is a flat mapping of field names to values, consumed whole by
//! a single `set` operation: the SetModel generator rule emits one `setText`
//! per field, locating each input by the operation's locator prefix plus the
//! field name. Implement [`FormModel`] by hand or with `#[derive(FormModel)]`
//! from the `derive` feature.

use serde::{Deserialize, Serialize};

/// One named field of a form model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// Field name, used as the locator suffix
    pub name: String,
    /// Value typed into the located input
    pub value: String,
}

impl FormField {
    /// Create a form field
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A flat field-name-to-value mapping settable as one operation
pub trait FormModel {
    /// The model's fields, in declaration order
    fn fields(&self) -> Vec<FormField>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Credentials {
        username: String,
        password: String,
    }

    impl FormModel for Credentials {
        fn fields(&self) -> Vec<FormField> {
            vec![
                FormField::new("username", self.username.clone()),
                FormField::new("password", self.password.clone()),
            ]
        }
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let model = Credentials {
            username: "a".to_string(),
            password: "b".to_string(),
        };
        let fields = model.fields();
        assert_eq!(fields[0], FormField::new("username", "a"));
        assert_eq!(fields[1], FormField::new("password", "b"));
    }
}
