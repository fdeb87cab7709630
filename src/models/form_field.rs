use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Select,
    Number,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Select => "select",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "select" => Ok(Self::Select),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            _ => Err(format!("invalid field type '{}'", s)),
        }
    }
}

/// Definition of one input on a website form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub id: Uuid,
    pub form_type: String,
    pub field_name: String,
    pub field_label: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Comma separated choices for `select` fields.
    pub options: Option<String>,
}

impl FormField {
    pub fn option_list(&self) -> Vec<&str> {
        self.options
            .as_deref()
            .map(|o| o.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}
