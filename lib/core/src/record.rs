use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use crate::matcher::normalize_code;

/// Presentation style of the token rendered for a matched record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStyle {
    /// Yellow background, black text
    Yellow,
    /// Red background, white text
    Red,
}

impl TokenStyle {
    /// Background colour as RGB
    #[inline]
    pub fn background(&self) -> (u8, u8, u8) {
        match self {
            TokenStyle::Yellow => (0xFF, 0xFF, 0x00),
            TokenStyle::Red => (0xFF, 0x00, 0x00),
        }
    }

    /// Foreground colour as RGB, chosen to stay readable on the background
    #[inline]
    pub fn foreground(&self) -> (u8, u8, u8) {
        match self {
            TokenStyle::Yellow => (0x00, 0x00, 0x00),
            TokenStyle::Red => (0xFF, 0xFF, 0xFF),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStyle::Yellow => "yellow",
            TokenStyle::Red => "red",
        }
    }
}

/// Category tag of a record.
///
/// The label is kept exactly as stored so it can be shown back to the user;
/// only [`Classifier::style`] interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Classifier(String);

impl Classifier {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// "Amarillo"/"yellow" select the yellow token, every other label is red
    pub fn style(&self) -> TokenStyle {
        let label = self.0.trim();
        if label.eq_ignore_ascii_case("amarillo") || label.eq_ignore_ascii_case("yellow") {
            TokenStyle::Yellow
        } else {
            TokenStyle::Red
        }
    }
}

impl std::fmt::Display for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Classifier {
    fn from(s: &str) -> Self {
        Classifier(s.to_string())
    }
}

impl From<String> for Classifier {
    fn from(s: String) -> Self {
        Classifier(s)
    }
}

impl<'de> Deserialize<'de> for Classifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(Classifier)
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Primary lookup key
    #[serde(default, deserialize_with = "string_or_number")]
    pub barcode: String,
    /// Token shown when the record is matched
    #[serde(default, alias = "numero", deserialize_with = "string_or_number")]
    pub display_value: String,
    #[serde(default, alias = "color")]
    pub classifier: Classifier,
    #[serde(default, alias = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, alias = "precio", skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<Value>,
}

impl ProductRecord {
    #[inline]
    #[must_use]
    pub fn new(
        barcode: impl Into<String>,
        display_value: impl Into<String>,
        classifier: impl Into<Classifier>,
    ) -> Self {
        Self {
            barcode: barcode.into(),
            display_value: display_value.into(),
            classifier: classifier.into(),
            name: None,
            category: None,
            price: None,
            stock: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_price(mut self, price: Value) -> Self {
        self.price = Some(price);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_stock(mut self, stock: Value) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Barcode in the form used for equality: trimmed and uppercased
    #[inline]
    pub fn normalized_barcode(&self) -> String {
        normalize_code(&self.barcode)
    }

    #[inline]
    pub fn token_style(&self) -> TokenStyle {
        self.classifier.style()
    }
}

/// Accepts a JSON string or number (hand-maintained tables mix both) and
/// maps `null` to an empty string.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}
