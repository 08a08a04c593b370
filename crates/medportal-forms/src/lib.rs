//! Patient Portal Form Engine
//!
//! Declarative forms for the portal's sign-up and profile screens.
//!
//! ## Pipeline
//! - [`FieldConfigs`]: ordered mapping of field name → [`FieldConfig`]
//! - [`build_layout_tree`]: compiles the mapping into [`LayoutNode`]s,
//!   grouping *adjacent* fields by their `set` / `group` annotations
//! - [`render_form`]: walks the tree against a [`FormController`], expanding
//!   nested `object` fields into dotted paths (`address.city`)

use thiserror::Error;

pub mod field;
pub mod layout;
pub mod render;

pub use field::{
    validate_configs, CheckboxItem, EndText, FieldConfig, FieldConfigs, FieldKind, GroupConfig,
    InputAttrs, Orientation, RadioOption, RadioSize, SelectOption, SetConfig, SliderAttrs,
    SliderValue, TextareaAttrs,
};
pub use layout::{build_layout_tree, LayoutNode, DEFAULT_SET_NAME};
pub use render::{field_paths, render_form, Control, FormController, FormState, RenderNode};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormsError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid field config for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("form values must be a JSON object")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, FormsError>;
