//! Layout compiler
//!
//! Turns an ordered [`FieldConfigs`] mapping into a list of [`LayoutNode`]s.
//! Grouping is strictly by adjacency: two fields annotated with the same
//! group name but separated by another field produce two distinct groups.
//!
//! ```text
//! a:{group x}  b:{group y}  c:{group x}   →   Group x[a]  Group y[b]  Group x[c]
//! ```
//!
//! A field's `set` takes precedence over its `group`. Members of a set are
//! stripped of both annotations and laid out recursively.

use crate::field::{FieldConfig, FieldConfigs, GroupConfig, SetConfig};
use serde::Serialize;

/// Name given to a set whose legend is absent or empty
pub const DEFAULT_SET_NAME: &str = "default-set";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutNode {
    Field {
        name: String,
        config: FieldConfig,
    },
    Group {
        name: String,
        config: GroupConfig,
        children: Vec<LayoutNode>,
    },
    Set {
        name: String,
        config: SetConfig,
        children: Vec<LayoutNode>,
    },
}

impl LayoutNode {
    pub fn name(&self) -> &str {
        match self {
            LayoutNode::Field { name, .. }
            | LayoutNode::Group { name, .. }
            | LayoutNode::Set { name, .. } => name,
        }
    }

    pub fn children(&self) -> &[LayoutNode] {
        match self {
            LayoutNode::Field { .. } => &[],
            LayoutNode::Group { children, .. } | LayoutNode::Set { children, .. } => children,
        }
    }

    /// Names of every field below (or at) this node, in order
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            LayoutNode::Field { name, .. } => vec![name.as_str()],
            _ => self.children().iter().flat_map(LayoutNode::field_names).collect(),
        }
    }
}

/// Compile field configs into layout nodes. Single forward pass with one
/// cursor; never fails.
pub fn build_layout_tree(configs: &FieldConfigs) -> Vec<LayoutNode> {
    let entries: Vec<(&String, &FieldConfig)> = configs.iter().collect();
    let mut nodes = Vec::new();
    let mut i = 0;

    while i < entries.len() {
        let (name, config) = entries[i];

        if let Some(set) = &config.set {
            // Only entries that declare a set with an equal legend join the run
            let mut interior = FieldConfigs::new();
            let mut j = i;
            while let Some((member, member_config)) = entries.get(j) {
                let same_set = member_config
                    .set
                    .as_ref()
                    .is_some_and(|s| s.legend == set.legend);
                if !same_set {
                    break;
                }
                interior.insert((*member).clone(), member_config.without_layout());
                j += 1;
            }

            nodes.push(LayoutNode::Set {
                name: set_name(set),
                config: set.clone(),
                children: build_layout_tree(&interior),
            });
            i = j;
            continue;
        }

        if let Some(group) = &config.group {
            let mut children = Vec::new();
            let mut j = i;
            while let Some((member, member_config)) = entries.get(j) {
                // A set annotation on a later member wins over its group
                let same_group = member_config.set.is_none()
                    && member_config
                        .group
                        .as_ref()
                        .is_some_and(|g| g.name == group.name);
                if !same_group {
                    break;
                }
                children.push(LayoutNode::Field {
                    name: (*member).clone(),
                    config: (*member_config).clone(),
                });
                j += 1;
            }

            nodes.push(LayoutNode::Group {
                name: group.name.clone(),
                config: group.clone(),
                children,
            });
            i = j;
            continue;
        }

        nodes.push(LayoutNode::Field {
            name: name.clone(),
            config: config.clone(),
        });
        i += 1;
    }

    nodes
}

fn set_name(set: &SetConfig) -> String {
    match set.legend.as_deref() {
        Some(legend) if !legend.is_empty() => legend.to_string(),
        _ => DEFAULT_SET_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Orientation;
    use proptest::prelude::*;

    fn configs(entries: Vec<(&str, FieldConfig)>) -> FieldConfigs {
        entries
            .into_iter()
            .map(|(name, config)| (name.to_string(), config))
            .collect()
    }

    fn grouped(name: &str) -> FieldConfig {
        FieldConfig::text(name).in_group(name, Orientation::Horizontal)
    }

    #[test]
    fn test_groups_are_adjacency_based() {
        let form = configs(vec![
            ("a", FieldConfig::text("A").in_group("x", Orientation::Horizontal)),
            ("b", FieldConfig::text("B").in_group("y", Orientation::Horizontal)),
            ("c", FieldConfig::text("C").in_group("x", Orientation::Horizontal)),
        ]);

        let tree = build_layout_tree(&form);
        let shape: Vec<_> = tree.iter().map(|n| (n.name(), n.field_names())).collect();
        assert_eq!(
            shape,
            vec![("x", vec!["a"]), ("y", vec!["b"]), ("x", vec!["c"])]
        );
        assert!(tree.iter().all(|n| matches!(n, LayoutNode::Group { .. })));
    }

    #[test]
    fn test_adjacent_group_members_collapse() {
        let form = configs(vec![
            ("first", FieldConfig::text("First").in_group("name", Orientation::Responsive)),
            ("last", FieldConfig::text("Last").in_group("name", Orientation::Responsive)),
            ("email", FieldConfig::email("Email")),
        ]);

        let tree = build_layout_tree(&form);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].field_names(), ["first", "last"]);
        match &tree[1] {
            LayoutNode::Field { name, .. } => assert_eq!(name, "email"),
            other => panic!("expected field, got {other:?}"),
        }
    }

    #[test]
    fn test_set_takes_precedence_over_group() {
        let form = configs(vec![
            ("phone", FieldConfig::text("Phone").in_group("info", Orientation::Horizontal)),
            (
                "street",
                FieldConfig::text("Street")
                    .in_group("info", Orientation::Horizontal)
                    .in_set(Some("Address")),
            ),
            ("city", FieldConfig::text("City").in_set(Some("Address"))),
        ]);

        let tree = build_layout_tree(&form);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name(), "info");
        assert_eq!(tree[0].field_names(), ["phone"]);

        match &tree[1] {
            LayoutNode::Set { name, children, .. } => {
                assert_eq!(name, "Address");
                assert_eq!(children.len(), 2);
                for child in children {
                    match child {
                        LayoutNode::Field { config, .. } => {
                            assert!(config.set.is_none());
                            assert!(config.group.is_none());
                        }
                        other => panic!("set interior should be flat, got {other:?}"),
                    }
                }
            }
            other => panic!("expected set, got {other:?}"),
        }
    }

    #[test]
    fn test_sets_split_on_legend_change() {
        let form = configs(vec![
            ("a", FieldConfig::text("A").in_set(Some("Contact"))),
            ("b", FieldConfig::text("B").in_set(Some("Contact"))),
            ("c", FieldConfig::text("C").in_set(Some("Billing"))),
            ("d", FieldConfig::text("D").in_set(Some("Contact"))),
        ]);

        let tree = build_layout_tree(&form);
        let shape: Vec<_> = tree.iter().map(|n| (n.name(), n.field_names())).collect();
        assert_eq!(
            shape,
            vec![
                ("Contact", vec!["a", "b"]),
                ("Billing", vec!["c"]),
                ("Contact", vec!["d"])
            ]
        );
    }

    #[test]
    fn test_adjacent_unnamed_sets_merge_into_default_set() {
        let form = configs(vec![
            ("a", FieldConfig::text("A").in_set(None)),
            ("b", FieldConfig::text("B").in_set(None)),
            ("c", FieldConfig::text("C")),
        ]);

        let tree = build_layout_tree(&form);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name(), DEFAULT_SET_NAME);
        assert_eq!(tree[0].field_names(), ["a", "b"]);
        // Fields without any set are never pulled into an unnamed set
        assert!(matches!(&tree[1], LayoutNode::Field { name, .. } if name == "c"));
    }

    #[test]
    fn test_empty_legend_is_distinct_from_absent_legend() {
        let form = configs(vec![
            ("a", FieldConfig::text("A").in_set(None)),
            ("b", FieldConfig::text("B").in_set(Some(""))),
        ]);

        let tree = build_layout_tree(&form);
        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|n| n.name() == DEFAULT_SET_NAME));
    }

    #[test]
    fn test_empty_configs() {
        assert!(build_layout_tree(&FieldConfigs::new()).is_empty());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let form = configs(vec![
            ("a", grouped("x")),
            ("b", FieldConfig::text("B").in_set(Some("S"))),
            ("c", FieldConfig::date("C")),
        ]);
        assert_eq!(build_layout_tree(&form), build_layout_tree(&form));
    }

    #[test]
    fn test_layout_serializes_with_type_tag() {
        let form = configs(vec![("a", grouped("x"))]);
        let json = serde_json::to_value(build_layout_tree(&form)).unwrap();
        assert_eq!(json[0]["type"], "group");
        assert_eq!(json[0]["children"][0]["type"], "field");
        assert_eq!(json[0]["children"][0]["name"], "a");
    }

    fn maximal_runs(labels: &[Option<u8>]) -> usize {
        let mut runs = 0;
        let mut previous: Option<u8> = None;
        for label in labels {
            if let Some(l) = label {
                if previous != Some(*l) {
                    runs += 1;
                }
            }
            previous = *label;
        }
        runs
    }

    proptest! {
        #[test]
        fn prop_one_group_per_maximal_run(labels in prop::collection::vec(prop::option::of(0u8..3), 0..24)) {
            let form: FieldConfigs = labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let config = match label {
                        Some(l) => FieldConfig::text("f").in_group(format!("g{l}"), Orientation::Horizontal),
                        None => FieldConfig::text("f"),
                    };
                    (format!("f{i}"), config)
                })
                .collect();

            let tree = build_layout_tree(&form);
            let groups = tree.iter().filter(|n| matches!(n, LayoutNode::Group { .. })).count();
            prop_assert_eq!(groups, maximal_runs(&labels));

            // Every field appears exactly once, in declaration order
            let flattened: Vec<String> = tree
                .iter()
                .flat_map(|n| n.field_names().into_iter().map(String::from).collect::<Vec<_>>())
                .collect();
            let expected: Vec<String> = form.keys().cloned().collect();
            prop_assert_eq!(flattened, expected);
        }
    }
}
