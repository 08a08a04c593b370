//! Tree renderer
//!
//! Walks a compiled layout against a [`FormController`] and produces
//! [`RenderNode`]s carrying the control to draw, the bound value and any
//! validation messages. `object` fields recurse: their children are laid out
//! with [`build_layout_tree`] and bound under `<parent>.<child>`.

use crate::field::{
    CheckboxItem, EndText, FieldConfig, FieldConfigs, FieldKind, Orientation, RadioOption,
    RadioSize, SelectOption, SliderAttrs,
};
use crate::layout::{build_layout_tree, LayoutNode};
use crate::FormsError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// =============================================================================
// Controller
// =============================================================================

/// Source of form values and validation state, addressed by dotted path
pub trait FormController {
    fn value(&self, path: &str) -> Option<&Value>;
    fn errors(&self, path: &str) -> &[String];
    fn set_value(&mut self, path: &str, value: Value) -> Result<(), FormsError>;
    fn can_submit(&self) -> bool;
}

/// In-memory controller over a JSON object
#[derive(Clone, Debug, Default)]
pub struct FormState {
    values: Map<String, Value>,
    errors: BTreeMap<String, Vec<String>>,
    submitting: bool,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Value) -> Result<Self, FormsError> {
        match values {
            Value::Object(values) => Ok(Self {
                values,
                ..Self::default()
            }),
            _ => Err(FormsError::NotAnObject),
        }
    }

    pub fn add_error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.entry(path.to_string()).or_default().push(message.into());
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl FormController for FormState {
    fn value(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    fn errors(&self, path: &str) -> &[String] {
        self.errors.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    fn set_value(&mut self, path: &str, value: Value) -> Result<(), FormsError> {
        let segments: Vec<&str> = path.split('.').collect();
        let (leaf, parents) = segments
            .split_last()
            .ok_or_else(|| FormsError::UnknownField(path.to_string()))?;

        let mut target = &mut self.values;
        for segment in parents {
            let next = target
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            target = match next {
                Value::Object(map) => map,
                _ => return Err(FormsError::UnknownField(path.to_string())),
            };
        }
        target.insert(leaf.to_string(), value);
        Ok(())
    }

    fn can_submit(&self) -> bool {
        !self.submitting && self.errors.values().all(Vec::is_empty)
    }
}

// =============================================================================
// Render Tree
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "kebab-case")]
pub enum Control {
    Input {
        input_type: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        autocomplete: Option<String>,
    },
    Textarea {
        rows: Option<u32>,
        end_text: Option<EndText>,
    },
    Select {
        options: Vec<SelectOption>,
    },
    Radio {
        options: Vec<RadioOption>,
        size: Option<RadioSize>,
    },
    Checkbox,
    CheckboxGroup {
        items: Vec<CheckboxItem>,
    },
    Switch,
    Slider(SliderAttrs),
    Custom {
        component: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum RenderNode {
    Set {
        legend: Option<String>,
        description: Option<String>,
        children: Vec<RenderNode>,
    },
    Group {
        name: String,
        orientation: Orientation,
        separator: bool,
        children: Vec<RenderNode>,
    },
    Object {
        path: String,
        title: Option<String>,
        description: Option<String>,
        children: Vec<RenderNode>,
    },
    Field {
        path: String,
        label: String,
        placeholder: Option<String>,
        description: Option<String>,
        orientation: Orientation,
        control: Control,
        value: Option<Value>,
        errors: Vec<String>,
    },
}

/// Render a form against its controller
pub fn render_form(configs: &FieldConfigs, controller: &dyn FormController) -> Vec<RenderNode> {
    tracing::trace!("Rendering form with {} top-level field(s)", configs.len());
    render_nodes(&build_layout_tree(configs), None, controller)
}

fn render_nodes(
    nodes: &[LayoutNode],
    parent: Option<&str>,
    controller: &dyn FormController,
) -> Vec<RenderNode> {
    nodes
        .iter()
        .map(|node| match node {
            LayoutNode::Set {
                config, children, ..
            } => RenderNode::Set {
                legend: config.legend.clone(),
                description: config.description.clone(),
                children: render_nodes(children, parent, controller),
            },
            LayoutNode::Group {
                name,
                config,
                children,
            } => RenderNode::Group {
                name: name.clone(),
                orientation: config.orientation.unwrap_or_default(),
                separator: config.separator,
                children: render_nodes(children, parent, controller),
            },
            LayoutNode::Field { name, config } => {
                render_field(&join_path(parent, name), config, controller)
            }
        })
        .collect()
}

fn render_field(path: &str, config: &FieldConfig, controller: &dyn FormController) -> RenderNode {
    let control = match &config.kind {
        FieldKind::Object { fields } => {
            return RenderNode::Object {
                path: path.to_string(),
                title: config.title.clone().or_else(|| Some(config.label.clone())),
                description: config.description.clone(),
                children: render_nodes(&build_layout_tree(fields), Some(path), controller),
            };
        }
        FieldKind::Text(attrs)
        | FieldKind::Email(attrs)
        | FieldKind::Password(attrs)
        | FieldKind::Number(attrs)
        | FieldKind::Tel(attrs)
        | FieldKind::Url(attrs)
        | FieldKind::File(attrs)
        | FieldKind::Date(attrs) => Control::Input {
            input_type: config.kind.input_type().unwrap_or("text"),
            autocomplete: attrs.autocomplete.clone(),
        },
        FieldKind::Textarea(attrs) => Control::Textarea {
            rows: attrs.rows,
            end_text: attrs.end_text.clone(),
        },
        FieldKind::Select { options } => Control::Select {
            options: options.clone(),
        },
        FieldKind::Radio { options, size } => Control::Radio {
            options: options.clone(),
            size: *size,
        },
        FieldKind::Checkbox => Control::Checkbox,
        FieldKind::CheckboxGroup { items } => Control::CheckboxGroup {
            items: items.clone(),
        },
        FieldKind::Switch => Control::Switch,
        FieldKind::Slider(attrs) => Control::Slider(attrs.clone()),
        FieldKind::Custom { component } => Control::Custom {
            component: component.clone(),
        },
    };

    RenderNode::Field {
        path: path.to_string(),
        label: config.label.clone(),
        placeholder: config.placeholder.clone(),
        description: config.description.clone(),
        orientation: config.orientation.unwrap_or_default(),
        control,
        value: controller.value(path).cloned(),
        errors: controller.errors(path).to_vec(),
    }
}

fn join_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{name}"),
        None => name.to_string(),
    }
}

/// Dotted paths of every bindable field, in render order
pub fn field_paths(configs: &FieldConfigs) -> Vec<String> {
    fn collect(configs: &FieldConfigs, parent: Option<&str>, out: &mut Vec<String>) {
        for node in build_layout_tree(configs) {
            for name in node.field_names() {
                let path = join_path(parent, name);
                match configs.get(name).map(|c| &c.kind) {
                    Some(FieldKind::Object { fields }) => collect(fields, Some(&path), out),
                    _ => out.push(path),
                }
            }
        }
    }

    let mut out = Vec::new();
    collect(configs, None, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address_form() -> FieldConfigs {
        let mut address = FieldConfigs::new();
        address.insert(
            "street".into(),
            FieldConfig::text("Street").in_group("address-1", Orientation::Horizontal),
        );
        address.insert(
            "city".into(),
            FieldConfig::text("City").in_group("address-1", Orientation::Horizontal),
        );
        address.insert(
            "zipCode".into(),
            FieldConfig::text("Zip code").in_group("address-2", Orientation::Horizontal),
        );

        let mut form = FieldConfigs::new();
        form.insert("phoneNumber".into(), FieldConfig::text("Phone number"));
        form.insert(
            "address".into(),
            FieldConfig::object("Address", address).in_set(Some("Address")),
        );
        form
    }

    #[test]
    fn test_nested_object_binds_dotted_paths() {
        let mut state = FormState::with_values(json!({
            "phoneNumber": "555-0100",
            "address": { "city": "Springfield" }
        }))
        .unwrap();
        state.add_error("address.city", "City is required");

        let tree = render_form(&address_form(), &state);
        assert_eq!(tree.len(), 2);

        let RenderNode::Set { children, .. } = &tree[1] else {
            panic!("expected address set, got {:?}", tree[1]);
        };
        let RenderNode::Object { path, children, .. } = &children[0] else {
            panic!("expected object node");
        };
        assert_eq!(path, "address");

        let RenderNode::Group { name, children, .. } = &children[0] else {
            panic!("expected group node");
        };
        assert_eq!(name, "address-1");
        match &children[1] {
            RenderNode::Field {
                path,
                value,
                errors,
                ..
            } => {
                assert_eq!(path, "address.city");
                assert_eq!(value, &Some(json!("Springfield")));
                assert_eq!(errors, &vec!["City is required".to_string()]);
            }
            other => panic!("expected field, got {other:?}"),
        }
    }

    #[test]
    fn test_field_paths_follow_render_order() {
        assert_eq!(
            field_paths(&address_form()),
            ["phoneNumber", "address.street", "address.city", "address.zipCode"]
        );
    }

    #[test]
    fn test_set_value_creates_nested_objects() {
        let mut state = FormState::new();
        state.set_value("address.state", json!("IL")).unwrap();
        assert_eq!(state.value("address.state"), Some(&json!("IL")));
        assert_eq!(state.values()["address"], json!({ "state": "IL" }));

        state.set_value("phoneNumber", json!("555")).unwrap();
        assert!(matches!(
            state.set_value("phoneNumber.extension", json!("1")),
            Err(FormsError::UnknownField(_))
        ));
    }

    #[test]
    fn test_can_submit_tracks_errors_and_submission() {
        let mut state = FormState::new();
        assert!(state.can_submit());

        state.add_error("email", "Invalid email");
        assert!(!state.can_submit());

        state.clear_errors();
        state.set_submitting(true);
        assert!(!state.can_submit());
    }

    #[test]
    fn test_with_values_rejects_non_object() {
        assert!(matches!(
            FormState::with_values(json!([1, 2])),
            Err(FormsError::NotAnObject)
        ));
    }
}
