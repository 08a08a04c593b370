//! Built-in sign-up forms

use medportal_forms::{FieldConfig, FieldConfigs, Orientation, SelectOption};

pub const SIGN_UP_FORM: &str = "sign-up";
pub const USER_DATA_FORM: &str = "user-data";

pub fn sign_up_form() -> FieldConfigs {
    let mut form = FieldConfigs::new();
    form.insert(
        "firstName".into(),
        FieldConfig::text("First name").in_group("name", Orientation::Horizontal),
    );
    form.insert(
        "lastName".into(),
        FieldConfig::text("Last name").in_group("name", Orientation::Horizontal),
    );
    form.insert("email".into(), FieldConfig::email("Email"));
    form.insert(
        "password".into(),
        FieldConfig::password("Password").in_group("password", Orientation::Horizontal),
    );
    form.insert(
        "confirmPassword".into(),
        FieldConfig::password("Confirm password").in_group("password", Orientation::Horizontal),
    );
    form.insert(
        "profileImage".into(),
        FieldConfig::file("Profile image (optional)"),
    );
    form
}

pub fn user_data_form(specialists: &[SelectOption]) -> FieldConfigs {
    let mut address = FieldConfigs::new();
    for (name, label, group) in [
        ("city", "City", "address-1"),
        ("state", "State", "address-1"),
        ("street", "Street", "address-2"),
        ("zipCode", "Zip code", "address-2"),
    ] {
        address.insert(
            name.into(),
            FieldConfig::text(label).in_group(group, Orientation::Horizontal),
        );
    }

    let mut form = FieldConfigs::new();
    form.insert(
        "phoneNumber".into(),
        FieldConfig::text("Phone number").in_group("info", Orientation::Horizontal),
    );
    form.insert(
        "dateOfBirth".into(),
        FieldConfig::date("Date of birth").in_group("info", Orientation::Horizontal),
    );
    form.insert(
        "address".into(),
        FieldConfig::object("Address", address)
            .in_group("address", Orientation::Vertical)
            .in_set(Some("Address")),
    );
    form.insert(
        "primaryCareSpecialist".into(),
        FieldConfig::select("Primary care specialist", specialists.to_vec())
            .in_group("info", Orientation::Horizontal)
            .with_placeholder("Select a General Practice specialist"),
    );
    form
}

/// Built-in form by name
pub fn form_by_name(name: &str, specialists: &[SelectOption]) -> Option<FieldConfigs> {
    match name {
        SIGN_UP_FORM => Some(sign_up_form()),
        USER_DATA_FORM => Some(user_data_form(specialists)),
        _ => None,
    }
}
