//! Field configuration schema

use crate::FormsError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping of field name → configuration. Insertion order is the
/// render order and drives adjacency grouping.
pub type FieldConfigs = IndexMap<String, FieldConfig>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
    /// Horizontal on wide screens, vertical otherwise
    Responsive,
}

/// Side-by-side grouping of adjacent fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub separator: bool,
}

/// Legend-wrapped set of adjacent fields. Takes precedence over `group`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<SetConfig>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Field type discriminant and type-specific attributes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Text(InputAttrs),
    Email(InputAttrs),
    Password(InputAttrs),
    Number(InputAttrs),
    Tel(InputAttrs),
    Url(InputAttrs),
    File(InputAttrs),
    Date(InputAttrs),
    Textarea(TextareaAttrs),
    Select {
        options: Vec<SelectOption>,
    },
    Radio {
        options: Vec<RadioOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<RadioSize>,
    },
    Checkbox,
    CheckboxGroup {
        items: Vec<CheckboxItem>,
    },
    Switch,
    Slider(SliderAttrs),
    /// Rendered by an externally registered component
    Custom {
        component: String,
    },
    /// Nested sub-form bound under `<name>.<child>`
    Object {
        fields: FieldConfigs,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextareaAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_text: Option<EndText>,
}

/// Counter shown after a textarea, e.g. `42 / 500 characters`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndText {
    pub value_field: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioSize {
    Small,
    Large,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxItem {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliderAttrs {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default)]
    pub range: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SliderValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SliderValue {
    Single(f64),
    Range([f64; 2]),
}

impl FieldKind {
    /// HTML input type for text-like kinds
    pub fn input_type(&self) -> Option<&'static str> {
        match self {
            FieldKind::Text(_) => Some("text"),
            FieldKind::Email(_) => Some("email"),
            FieldKind::Password(_) => Some("password"),
            FieldKind::Number(_) => Some("number"),
            FieldKind::Tel(_) => Some("tel"),
            FieldKind::Url(_) => Some("url"),
            FieldKind::File(_) => Some("file"),
            FieldKind::Date(_) => Some("date"),
            _ => None,
        }
    }
}

impl FieldConfig {
    pub fn new(label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            label: label.into(),
            title: None,
            placeholder: None,
            description: None,
            orientation: None,
            group: None,
            set: None,
            kind,
        }
    }

    pub fn text(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::Text(InputAttrs::default()))
    }

    pub fn email(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::Email(InputAttrs::default()))
    }

    pub fn password(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::Password(InputAttrs::default()))
    }

    pub fn date(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::Date(InputAttrs::default()))
    }

    pub fn file(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::File(InputAttrs::default()))
    }

    pub fn select(label: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(label, FieldKind::Select { options })
    }

    pub fn object(label: impl Into<String>, fields: FieldConfigs) -> Self {
        Self::new(label, FieldKind::Object { fields })
    }

    pub fn in_group(mut self, name: impl Into<String>, orientation: Orientation) -> Self {
        self.group = Some(GroupConfig {
            name: name.into(),
            orientation: Some(orientation),
            separator: false,
        });
        self
    }

    pub fn in_set(mut self, legend: Option<&str>) -> Self {
        self.set = Some(SetConfig {
            legend: legend.map(String::from),
            description: None,
        });
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Copy of this config with `set` and `group` removed
    pub(crate) fn without_layout(&self) -> Self {
        Self {
            set: None,
            group: None,
            ..self.clone()
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, FieldKind::Object { .. })
    }
}

/// Check type-specific constraints of every field, recursing into objects
pub fn validate_configs(configs: &FieldConfigs) -> Result<(), FormsError> {
    for (name, config) in configs {
        let invalid = |reason: &str| FormsError::InvalidConfig {
            field: name.clone(),
            reason: reason.to_string(),
        };

        match &config.kind {
            FieldKind::Slider(slider) => {
                if slider.min > slider.max {
                    return Err(invalid("slider min exceeds max"));
                }
                match (&slider.default_value, slider.range) {
                    (Some(SliderValue::Single(_)), true) => {
                        return Err(invalid("range slider needs a [min, max] default"))
                    }
                    (Some(SliderValue::Range(_)), false) => {
                        return Err(invalid("single slider needs a numeric default"))
                    }
                    _ => {}
                }
            }
            FieldKind::Select { options } if options.is_empty() => {
                return Err(invalid("select has no options"));
            }
            FieldKind::Object { fields } => validate_configs(fields)?,
            _ => {}
        }
    }
    Ok(())
}
