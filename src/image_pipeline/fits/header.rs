//! Header key/value store of a FITS unit

/// Value of a header card
#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    String(String),
    Integer(i64),
    Float(f64),
    Logical(bool),
}

impl CardValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CardValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CardValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CardValue::Float(f) => Some(*f),
            CardValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CardValue::Logical(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for CardValue {
    fn from(value: &str) -> Self {
        CardValue::String(value.to_string())
    }
}

impl From<String> for CardValue {
    fn from(value: String) -> Self {
        CardValue::String(value)
    }
}

impl From<i64> for CardValue {
    fn from(value: i64) -> Self {
        CardValue::Integer(value)
    }
}

impl From<f64> for CardValue {
    fn from(value: f64) -> Self {
        CardValue::Float(value)
    }
}

impl From<bool> for CardValue {
    fn from(value: bool) -> Self {
        CardValue::Logical(value)
    }
}

/// Header cards in file order. Keys are stored upper-case and are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitHeader {
    cards: Vec<(String, CardValue)>,
}

impl UnitHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a card, replacing the value in place when the key already exists.
    pub fn set(&mut self, key: &str, value: impl Into<CardValue>) {
        let key = key.trim().to_uppercase();
        let value = value.into();
        match self.cards.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.cards.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CardValue> {
        let key = key.trim().to_uppercase();
        self.cards.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(CardValue::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(CardValue::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(CardValue::as_f64)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CardValue)> {
        self.cards.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
