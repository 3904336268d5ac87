//! Inline keyboard markup attached to outgoing messages.

use serde::{Deserialize, Serialize};

use crate::callback::CallbackData;

/// A single inline button: a visible label plus the callback payload the
/// client echoes back when the button is pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Text shown on the button.
    pub label: String,
    /// Encoded [`CallbackData`].
    pub data: String,
}

impl Button {
    /// Creates a button whose payload is the encoded form of `data`.
    pub fn new(label: impl Into<String>, data: &CallbackData) -> Self {
        Self {
            label: label.into(),
            data: data.encode(),
        }
    }
}

/// Rows of inline buttons rendered under a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    /// Button rows, top to bottom.
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Creates an empty keyboard.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Appends a row of buttons.
    #[must_use]
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Appends a row holding a single button.
    #[must_use]
    pub fn single(self, label: impl Into<String>, data: &CallbackData) -> Self {
        self.row(vec![Button::new(label, data)])
    }

    /// Iterates over every button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Finds the first button with the given label.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<&Button> {
        self.buttons().find(|b| b.label == label)
    }
}
