use std::collections::HashMap;

use metals::Metal;

/// Page element the client writes into, addressed by CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Price(Metal),
    Countdown,
    CurrentDate,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Price(Metal::Gold),
        Field::Price(Metal::Silver),
        Field::Price(Metal::Platinum),
        Field::Price(Metal::Palladium),
        Field::Countdown,
        Field::CurrentDate,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            Field::Price(Metal::Gold) => "gold_price",
            Field::Price(Metal::Silver) => "silver_price",
            Field::Price(Metal::Platinum) => "platinum_price",
            Field::Price(Metal::Palladium) => "palladium_price",
            Field::Countdown => "countdown",
            Field::CurrentDate => "current_date",
        }
    }
}

/// One write of inner HTML into a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomUpdate {
    pub field: Field,
    pub html: String,
}

impl DomUpdate {
    pub fn new(field: Field, html: impl Into<String>) -> Self {
        Self {
            field,
            html: html.into(),
        }
    }
}

/// Binding to the page markup.
pub trait PriceDisplay {
    /// Replaces the inner HTML of every element carrying `field`'s class.
    /// A page without such an element ignores the call.
    fn set_html(&mut self, field: Field, html: &str);
}

/// Page model holding only the elements it was built with.
#[derive(Debug, Clone, Default)]
pub struct MemoryDisplay {
    elements: HashMap<Field, String>,
}

impl MemoryDisplay {
    /// A page with every bound element present and empty.
    pub fn full_page() -> Self {
        Self::with_fields(&Field::ALL)
    }

    pub fn with_fields(fields: &[Field]) -> Self {
        Self {
            elements: fields.iter().map(|f| (*f, String::new())).collect(),
        }
    }

    /// Current content, `None` when the element is not on the page.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.elements.get(&field).map(String::as_str)
    }
}

impl PriceDisplay for MemoryDisplay {
    fn set_html(&mut self, field: Field, html: &str) {
        if let Some(slot) = self.elements.get_mut(&field) {
            html.clone_into(slot);
        }
    }
}
