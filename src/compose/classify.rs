//! Column naming convention
//!
//! | Column          | Meaning                                        |
//! |-----------------|------------------------------------------------|
//! | `@Id`           | identity of the row's object (not emitted)     |
//! | `Pilot_Name`    | field `Name` of the sub-object `Pilot`         |
//! | `#Moons_Name`   | field `Name` of one entry of the list `Moons`  |
//! | `#Tags`         | one value appended to the array `Tags`         |
//! | anything else   | plain scalar field                             |
//!
//! Every name lands in exactly one category. Names that only half match a
//! pattern (`_Name`, `Pilot_`, `#`, `#_Name`) fall back to plain scalars.

use crate::error::{RecastError, Result};
use crate::types::{Field, MapConfig, Scalar};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// The category a single column name falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass<'a> {
    Identity,
    Scalar,
    SubObject { group: &'a str, field: &'a str },
    ListEntry { list: &'a str, field: &'a str },
    Array { name: &'a str },
}

/// Fields collected for one sub-object or one list entry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupInfo {
    pub name: String,
    pub fields: Vec<Field>,
}

impl GroupInfo {
    fn new(name: &str) -> Self {
        GroupInfo {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }
}

/// A row partitioned by the naming convention, each part in first-seen order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowInfo {
    /// Non-null identity value, if the row declares one
    pub identity: Option<Scalar>,
    pub scalars: Vec<Field>,
    pub sub_objects: Vec<GroupInfo>,
    pub lists: Vec<GroupInfo>,
    pub arrays: Vec<Field>,
}

/// Partitions flat rows according to a [`MapConfig`]
#[derive(Debug, Clone, Default)]
pub struct RowClassifier {
    config: MapConfig,
}

impl RowClassifier {
    pub fn new(config: MapConfig) -> Self {
        RowClassifier { config }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Classify a single column name
    pub fn classify_name<'a>(&self, name: &'a str) -> FieldClass<'a> {
        let config = &self.config;

        if self.is_passthrough(name) {
            trace!(column = name, "server pseudo-column kept as scalar");
            return FieldClass::Scalar;
        }

        if name.starts_with(config.identity_marker) {
            return FieldClass::Identity;
        }

        if let Some(rest) = name.strip_prefix(config.collection_marker) {
            return match rest.split_once(config.separator) {
                Some((list, field)) if !list.is_empty() && !field.is_empty() => {
                    FieldClass::ListEntry { list, field }
                }
                Some(_) => FieldClass::Scalar,
                None if !rest.is_empty() => FieldClass::Array { name: rest },
                None => FieldClass::Scalar,
            };
        }

        match name.split_once(config.separator) {
            Some((group, field)) if !group.is_empty() && !field.is_empty() => {
                FieldClass::SubObject { group, field }
            }
            _ => FieldClass::Scalar,
        }
    }

    /// Partition the fields of one row.
    ///
    /// Scalars and sub-object groups share the object's field namespace, so a
    /// name used twice among them is a [`RecastError::DuplicateFieldName`].
    /// A second identity column, or an array column repeated within the row,
    /// is rejected the same way: each row adds at most one entry per array.
    pub fn classify(&self, fields: &[Field]) -> Result<RowInfo> {
        let mut info = RowInfo::default();
        let mut seen_identity = false;
        let mut targets: HashSet<&str> = HashSet::new();
        let mut sub_object_index: HashMap<&str, usize> = HashMap::new();
        let mut list_index: HashMap<&str, usize> = HashMap::new();
        let mut array_names: HashSet<&str> = HashSet::new();

        for field in fields {
            match self.classify_name(&field.name) {
                FieldClass::Identity => {
                    if seen_identity {
                        return Err(RecastError::DuplicateFieldName {
                            name: field.name.clone(),
                        });
                    }
                    seen_identity = true;
                    if !field.value.is_null() {
                        info.identity = Some(field.value.clone());
                    }
                }
                FieldClass::Scalar => {
                    if !targets.insert(&field.name) {
                        return Err(RecastError::DuplicateFieldName {
                            name: field.name.clone(),
                        });
                    }
                    info.scalars.push(field.clone());
                }
                FieldClass::SubObject { group, field: sub_field } => {
                    let index = match sub_object_index.get(group) {
                        Some(&index) => index,
                        None => {
                            if !targets.insert(group) {
                                return Err(RecastError::DuplicateFieldName {
                                    name: group.to_string(),
                                });
                            }
                            info.sub_objects.push(GroupInfo::new(group));
                            sub_object_index.insert(group, info.sub_objects.len() - 1);
                            info.sub_objects.len() - 1
                        }
                    };
                    info.sub_objects[index]
                        .fields
                        .push(Field::new(sub_field, field.value.clone()));
                }
                FieldClass::ListEntry { list, field: sub_field } => {
                    let index = *list_index.entry(list).or_insert_with(|| {
                        info.lists.push(GroupInfo::new(list));
                        info.lists.len() - 1
                    });
                    info.lists[index]
                        .fields
                        .push(Field::new(sub_field, field.value.clone()));
                }
                FieldClass::Array { name } => {
                    if !array_names.insert(name) {
                        return Err(RecastError::DuplicateFieldName {
                            name: field.name.clone(),
                        });
                    }
                    info.arrays.push(Field::new(name, field.value.clone()));
                }
            }
        }

        Ok(info)
    }

    fn is_passthrough(&self, name: &str) -> bool {
        self.config
            .passthrough_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Row;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    fn classify(value: Value) -> Result<RowInfo> {
        RowClassifier::default().classify(row(value).fields())
    }

    #[test]
    fn test_classify_names() {
        let classifier = RowClassifier::default();

        assert_eq!(classifier.classify_name("@Id"), FieldClass::Identity);
        assert_eq!(classifier.classify_name("@"), FieldClass::Identity);
        assert_eq!(classifier.classify_name("Name"), FieldClass::Scalar);
        assert_eq!(
            classifier.classify_name("Pilot_Name"),
            FieldClass::SubObject { group: "Pilot", field: "Name" }
        );
        assert_eq!(
            classifier.classify_name("#Moons_Name"),
            FieldClass::ListEntry { list: "Moons", field: "Name" }
        );
        assert_eq!(classifier.classify_name("#Tags"), FieldClass::Array { name: "Tags" });
    }

    #[test]
    fn test_split_happens_at_first_separator() {
        let classifier = RowClassifier::default();

        assert_eq!(
            classifier.classify_name("Pilot_Ship_Name"),
            FieldClass::SubObject { group: "Pilot", field: "Ship_Name" }
        );
        assert_eq!(
            classifier.classify_name("#Moons_@Id"),
            FieldClass::ListEntry { list: "Moons", field: "@Id" }
        );
    }

    #[test]
    fn test_identity_wins_over_other_markers() {
        let classifier = RowClassifier::default();
        assert_eq!(classifier.classify_name("@Moons_Id"), FieldClass::Identity);
    }

    #[test]
    fn test_malformed_names_degrade_to_scalars() {
        let classifier = RowClassifier::default();

        for name in ["", "_Name", "Pilot_", "#", "#_Name", "#Moons_", "@@identity"] {
            assert_eq!(classifier.classify_name(name), FieldClass::Scalar, "name: {:?}", name);
        }
    }

    #[test]
    fn test_groups_accumulate_in_first_seen_order() {
        let info = classify(json!({
            "@Id": 1,
            "Name": "Vulcan",
            "Pilot_Name": "Spock",
            "#Moons_Name": "T'Khut",
            "Pilot_Rank": "Commander",
            "#Tags": "hot",
            "#Moons_Size": 3
        }))
        .unwrap();

        assert_eq!(info.identity, Some(Scalar::Int(1)));
        assert_eq!(info.scalars, vec![Field::new("Name", "Vulcan")]);

        assert_eq!(info.sub_objects.len(), 1);
        assert_eq!(info.sub_objects[0].name, "Pilot");
        assert_eq!(
            info.sub_objects[0].fields,
            vec![Field::new("Name", "Spock"), Field::new("Rank", "Commander")]
        );

        assert_eq!(info.lists.len(), 1);
        assert_eq!(info.lists[0].name, "Moons");
        assert_eq!(
            info.lists[0].fields,
            vec![Field::new("Name", "T'Khut"), Field::new("Size", 3)]
        );

        assert_eq!(info.arrays, vec![Field::new("Tags", "hot")]);
    }

    #[test]
    fn test_collection_marker_is_not_part_of_group_name() {
        let info = classify(json!({"Pilot_Name": "Kirk", "#Pilot_Name": "Sulu"})).unwrap();

        assert_eq!(info.sub_objects.len(), 1);
        assert_eq!(info.sub_objects[0].name, "Pilot");
        assert_eq!(info.sub_objects[0].fields, vec![Field::new("Name", "Kirk")]);

        assert_eq!(info.lists.len(), 1);
        assert_eq!(info.lists[0].name, "Pilot");
        assert_eq!(info.lists[0].fields, vec![Field::new("Name", "Sulu")]);
    }

    #[test]
    fn test_null_identity_is_absent() {
        let info = classify(json!({"@Id": null, "Name": "Vulcan"})).unwrap();
        assert_eq!(info.identity, None);
    }

    #[test]
    fn test_passthrough_column_is_scalar() {
        let info = classify(json!({"@@identity": 42})).unwrap();

        assert_eq!(info.identity, None);
        assert_eq!(info.scalars, vec![Field::new("@@identity", 42)]);
    }

    #[test]
    fn test_scalar_colliding_with_group_is_rejected() {
        let err = classify(json!({"Pilot": "Kirk", "Pilot_Rank": "Captain"})).unwrap_err();
        assert_eq!(err, RecastError::DuplicateFieldName { name: "Pilot".to_string() });
    }

    #[test]
    fn test_repeated_scalar_is_rejected() {
        let fields = vec![Field::new("Name", "Vulcan"), Field::new("Name", "Romulus")];
        let err = RowClassifier::default().classify(&fields).unwrap_err();
        assert_eq!(err, RecastError::DuplicateFieldName { name: "Name".to_string() });
    }

    #[test]
    fn test_repeated_array_column_is_rejected() {
        let fields = vec![Field::new("#Tags", "red"), Field::new("#Tags", "blue")];
        let err = RowClassifier::default().classify(&fields).unwrap_err();
        assert_eq!(err, RecastError::DuplicateFieldName { name: "#Tags".to_string() });
    }

    #[test]
    fn test_second_identity_column_is_rejected() {
        let err = classify(json!({"@Id": 1, "@Key": 2})).unwrap_err();
        assert_eq!(err, RecastError::DuplicateFieldName { name: "@Key".to_string() });
    }

    #[test]
    fn test_custom_markers() {
        let config = MapConfig {
            identity_marker: '$',
            collection_marker: '*',
            separator: '.',
            ..MapConfig::default()
        };
        let classifier = RowClassifier::new(config);

        assert_eq!(classifier.classify_name("$id"), FieldClass::Identity);
        assert_eq!(
            classifier.classify_name("*moons.name"),
            FieldClass::ListEntry { list: "moons", field: "name" }
        );
        assert_eq!(classifier.classify_name("*tags"), FieldClass::Array { name: "tags" });
        assert_eq!(classifier.classify_name("first_name"), FieldClass::Scalar);
    }

    #[test]
    fn test_classification_is_repeatable() {
        let input = row(json!({"@Id": 3, "Name": "Qo'noS", "#Moons_Name": "Praxis", "#Tags": "klingon"}));
        let classifier = RowClassifier::default();

        assert_eq!(
            classifier.classify(input.fields()).unwrap(),
            classifier.classify(input.fields()).unwrap()
        );
    }
}
