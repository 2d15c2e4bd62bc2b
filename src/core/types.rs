use serde::{Serialize, Deserialize};
use std::fmt;
use crate::core::error::{Error, Result};

/// Document number. Local to a segment inside the writer and codecs,
/// offset by the segment's doc base inside a `DirectoryReader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FieldValue::Text(s) => s.as_bytes(),
            FieldValue::Bytes(b) => b,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

/// How a field participates in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    pub indexed: bool,    // Contributes terms to the inverted index
    pub tokenized: bool,  // Text goes through the analyzer (ignored for bytes)
    pub stored: bool,     // Value retrievable verbatim
}

impl FieldType {
    pub const TEXT: FieldType = FieldType { indexed: true, tokenized: true, stored: false };
    pub const TEXT_STORED: FieldType = FieldType { indexed: true, tokenized: true, stored: true };
    pub const STRING: FieldType = FieldType { indexed: true, tokenized: false, stored: false };
    pub const STRING_STORED: FieldType = FieldType { indexed: true, tokenized: false, stored: true };
    pub const STORED_ONLY: FieldType = FieldType { indexed: false, tokenized: false, stored: true };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
            field_type,
        }
    }

    /// Analyzed text field
    pub fn text(name: impl Into<String>, value: impl Into<String>, stored: bool) -> Self {
        let field_type = if stored { FieldType::TEXT_STORED } else { FieldType::TEXT };
        Field::new(name, FieldValue::Text(value.into()), field_type)
    }

    /// Text indexed as a single term, without analysis
    pub fn string(name: impl Into<String>, value: impl Into<String>, stored: bool) -> Self {
        let field_type = if stored { FieldType::STRING_STORED } else { FieldType::STRING };
        Field::new(name, FieldValue::Text(value.into()), field_type)
    }

    pub fn bytes(name: impl Into<String>, value: Vec<u8>, indexed: bool, stored: bool) -> Self {
        Field::new(name, FieldValue::Bytes(value), FieldType {
            indexed,
            tokenized: false,
            stored,
        })
    }

    pub fn stored(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Field::new(name, value, FieldType::STORED_ONLY)
    }

    pub fn is_indexed(&self) -> bool {
        self.field_type.indexed
    }

    pub fn is_stored(&self) -> bool {
        self.field_type.stored
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_argument("field name must not be empty"));
        }
        if self.name.contains('\0') {
            return Err(Error::invalid_argument(format!(
                "field name {:?} contains a NUL character", self.name
            )));
        }
        if !self.field_type.indexed && !self.field_type.stored {
            return Err(Error::invalid_argument(format!(
                "field '{}' is neither indexed nor stored", self.name
            )));
        }
        Ok(())
    }
}

/// Ordered sequence of fields; names may repeat
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Document { fields: Vec::new() }
    }

    pub fn add(&mut self, field: Field) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn with(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// First field with the given name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_text())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.fields.iter().filter(move |f| f.name == name).map(|f| &f.value)
    }

    /// (name, value) pairs of the stored fields, in add order
    pub fn stored_values(&self) -> Vec<(&str, &FieldValue)> {
        self.fields.iter()
            .filter(|f| f.is_stored())
            .map(|f| (f.name.as_str(), &f.value))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A document needs at least one field and every field must be valid
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::invalid_argument("document has no fields"));
        }
        self.fields.iter().try_for_each(Field::validate)
    }
}

impl FromIterator<Field> for Document {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Document { fields: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_validation() {
        assert!(Field::text("title", "hello", true).validate().is_ok());
        assert!(Field::text("", "hello", true).validate().is_err());
        assert!(Field::text("a\0b", "hello", true).validate().is_err());

        let useless = Field::new("x", "v", FieldType { indexed: false, tokenized: false, stored: false });
        assert!(useless.validate().is_err());
    }

    #[test]
    fn test_document_lookup_keeps_add_order() {
        let doc = Document::new()
            .with(Field::text("tag", "first", true))
            .with(Field::string("id", "7", false))
            .with(Field::text("tag", "second", true));

        assert_eq!(doc.get_text("tag"), Some("first"));
        let tags: Vec<_> = doc.get_all("tag").filter_map(|v| v.as_text()).collect();
        assert_eq!(tags, vec!["first", "second"]);

        let stored = doc.stored_values();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].0, "tag");
    }

    #[test]
    fn test_document_validation() {
        assert!(Document::new().validate().is_err());
        let bad = Document::new()
            .with(Field::text("ok", "v", false))
            .with(Field::text("", "v", false));
        assert!(bad.validate().is_err());
        assert!(Document::new().with(Field::stored("raw", "v")).validate().is_ok());
    }
}
