//! Reading and writing CATMAID JSON exports.
//!
//! An export is a JSON array of records shaped as
//! `{ "model": <kind>, "pk": <id>, "fields": { ... } }`. Record kinds that
//! play no part in skeleton conversion (users, projects, stacks, ...) are
//! skipped when reading.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer as _, de, ser::SerializeSeq};
use serde_json::ser::PrettyFormatter;

use crate::domain::{
    ClassDef, Id, Instance, InstanceLink, Point, Record, RecordSet, RelationDef, TreeNode,
    TreeNodeLink,
};

const CLASS: &str = "catmaid.class";
const RELATION: &str = "catmaid.relation";
const INSTANCE: &str = "catmaid.classinstance";
const INSTANCE_LINK: &str = "catmaid.classinstanceclassinstance";
const TREENODE: &str = "catmaid.treenode";
const TREENODE_LINK: &str = "catmaid.treenodeclassinstance";

/// Errors that can occur when reading or writing CATMAID JSON.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document is not a JSON array of objects.
    #[error("invalid CATMAID JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The serialized export is not valid UTF-8.
    #[error("CATMAID JSON is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// A record of a known kind lacks an integer primary key.
    #[error("{model} record has invalid primary key {pk}")]
    Key {
        /// The record kind.
        model: String,
        /// The primary key as found in the document.
        pk: String,
    },
    /// A record's fields do not match its kind.
    #[error("invalid fields in {model} record {pk}: {source}")]
    Fields {
        /// The record kind.
        model: String,
        /// The primary key of the record.
        pk: Id,
        /// The underlying error.
        source: serde_json::Error,
    },
}

/// Values written to every generated record that the record model does not
/// carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Boilerplate {
    /// The operator creating the records.
    pub user: Id,
    /// Creation and edition time of every record.
    pub timestamp: DateTime<Utc>,
    /// Radius of every tree-node; `-1` means unset.
    pub radius: f64,
    /// Confidence of every tree-node.
    pub confidence: u8,
}

impl Boilerplate {
    /// Creates boilerplate with CATMAID's default radius and confidence.
    #[must_use]
    pub const fn new(user: Id, timestamp: DateTime<Utc>) -> Self {
        Self {
            user,
            timestamp,
            radius: -1.0,
            confidence: 5,
        }
    }
}

/// Parses a CATMAID JSON export.
///
/// # Errors
///
/// Returns an error if the input is not a JSON array of records, or if the
/// fields of a known record kind are malformed.
pub fn from_str(json: &str) -> Result<RecordSet, Error> {
    let raw: Vec<RawRecord> = serde_json::from_str(json)?;
    raw.into_iter()
        .filter_map(|record| record.decode().transpose())
        .collect()
}

/// Serializes a record set as a CATMAID JSON export.
///
/// Records are written in the order classes, relations, instances, instance
/// links, tree-nodes, tree-node links, indented by four spaces.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_string(records: &RecordSet, boilerplate: &Boilerplate) -> Result<String, Error> {
    let timestamp = boilerplate
        .timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let stamp = Stamp {
        user: boilerplate.user,
        creation_time: &timestamp,
        edition_time: &timestamp,
    };

    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    let mut seq = (&mut serializer).serialize_seq(Some(records.len()))?;

    for class in records.classes() {
        element(&mut seq, CLASS, class.id, &stamp, ClassFields::from(class))?;
    }
    for relation in records.relations() {
        let fields = RelationFields::from(relation);
        element(&mut seq, RELATION, relation.id, &stamp, fields)?;
    }
    for instance in records.instances() {
        let fields = InstanceFields::from(instance);
        element(&mut seq, INSTANCE, instance.id, &stamp, fields)?;
    }
    for link in records.instance_links() {
        let fields = InstanceLinkFields::from(link);
        element(&mut seq, INSTANCE_LINK, link.id, &stamp, fields)?;
    }
    for node in records.treenodes() {
        let fields = TreeNodeFields {
            editor: Some(boilerplate.user),
            radius: boilerplate.radius,
            confidence: boilerplate.confidence,
            ..TreeNodeFields::from(node)
        };
        element(&mut seq, TREENODE, node.id, &stamp, fields)?;
    }
    for link in records.treenode_links() {
        let fields = TreeNodeLinkFields::from(link);
        element(&mut seq, TREENODE_LINK, link.id, &stamp, fields)?;
    }
    seq.end()?;

    Ok(String::from_utf8(buffer)?)
}

fn element<S, F>(
    seq: &mut S,
    model: &'static str,
    pk: Id,
    stamp: &Stamp,
    fields: F,
) -> Result<(), S::Error>
where
    S: SerializeSeq,
    F: Serialize,
{
    seq.serialize_element(&Envelope {
        model,
        pk,
        fields: Stamped { stamp, fields },
    })
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    model: String,
    #[serde(default)]
    pk: serde_json::Value,
    #[serde(default)]
    fields: serde_json::Value,
}

type Decoder = fn(serde_json::Value, Id) -> serde_json::Result<Record>;

impl RawRecord {
    fn decode(self) -> Result<Option<Record>, Error> {
        let Self { model, pk, fields } = self;
        let decoder: Decoder = match model.as_str() {
            CLASS => {
                |fields, pk| parse::<ClassFields>(fields).map(|f| Record::Class(f.into_record(pk)))
            }
            RELATION => |fields, pk| {
                parse::<RelationFields>(fields).map(|f| Record::Relation(f.into_record(pk)))
            },
            INSTANCE => |fields, pk| {
                parse::<InstanceFields>(fields).map(|f| Record::Instance(f.into_record(pk)))
            },
            INSTANCE_LINK => |fields, pk| {
                parse::<InstanceLinkFields>(fields).map(|f| Record::InstanceLink(f.into_record(pk)))
            },
            TREENODE => |fields, pk| {
                parse::<TreeNodeFields>(fields).map(|f| Record::TreeNode(f.into_record(pk)))
            },
            TREENODE_LINK => |fields, pk| {
                parse::<TreeNodeLinkFields>(fields).map(|f| Record::TreeNodeLink(f.into_record(pk)))
            },
            _ => {
                tracing::debug!("skipping {model} record {pk}");
                return Ok(None);
            }
        };

        let Some(id) = pk.as_u64() else {
            return Err(Error::Key {
                model,
                pk: pk.to_string(),
            });
        };

        decoder(fields, id)
            .map(Some)
            .map_err(|source| Error::Fields { model, pk: id, source })
    }
}

fn parse<T: for<'de> Deserialize<'de>>(fields: serde_json::Value) -> serde_json::Result<T> {
    serde_json::from_value(fields)
}

#[derive(Debug, Serialize)]
struct Envelope<'a, F> {
    model: &'static str,
    pk: Id,
    fields: Stamped<'a, F>,
}

#[derive(Debug, Serialize)]
struct Stamped<'a, F> {
    #[serde(flatten)]
    stamp: &'a Stamp<'a>,
    #[serde(flatten)]
    fields: F,
}

#[derive(Debug, Serialize)]
struct Stamp<'a> {
    user: Id,
    creation_time: &'a str,
    edition_time: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassFields {
    class_name: String,
    #[serde(default)]
    description: String,
}

impl ClassFields {
    fn into_record(self, pk: Id) -> ClassDef {
        ClassDef {
            id: pk,
            name: self.class_name,
            description: self.description,
        }
    }
}

impl From<&ClassDef> for ClassFields {
    fn from(class: &ClassDef) -> Self {
        Self {
            class_name: class.name.clone(),
            description: class.description.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RelationFields {
    relation_name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    isreciprocal: bool,
}

impl RelationFields {
    fn into_record(self, pk: Id) -> RelationDef {
        RelationDef {
            id: pk,
            name: self.relation_name,
            description: self.description,
            reciprocal: self.isreciprocal,
        }
    }
}

impl From<&RelationDef> for RelationFields {
    fn from(relation: &RelationDef) -> Self {
        Self {
            relation_name: relation.name.clone(),
            uri: String::new(),
            description: relation.description.clone(),
            isreciprocal: relation.reciprocal,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct InstanceFields {
    class_column: Id,
    #[serde(default)]
    name: String,
}

impl InstanceFields {
    fn into_record(self, pk: Id) -> Instance {
        Instance {
            id: pk,
            class: self.class_column,
            name: self.name,
        }
    }
}

impl From<&Instance> for InstanceFields {
    fn from(instance: &Instance) -> Self {
        Self {
            class_column: instance.class,
            name: instance.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct InstanceLinkFields {
    relation: Id,
    class_instance_a: Id,
    class_instance_b: Id,
}

impl InstanceLinkFields {
    const fn into_record(self, pk: Id) -> InstanceLink {
        InstanceLink {
            id: pk,
            relation: self.relation,
            a: self.class_instance_a,
            b: self.class_instance_b,
        }
    }
}

impl From<&InstanceLink> for InstanceLinkFields {
    fn from(link: &InstanceLink) -> Self {
        Self {
            relation: link.relation,
            class_instance_a: link.a,
            class_instance_b: link.b,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TreeNodeFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    editor: Option<Id>,
    #[serde(deserialize_with = "coordinate")]
    location_x: i64,
    #[serde(deserialize_with = "coordinate")]
    location_y: i64,
    #[serde(deserialize_with = "coordinate")]
    location_z: i64,
    parent: Option<Id>,
    #[serde(default = "unset_radius")]
    radius: f64,
    #[serde(default)]
    confidence: u8,
    skeleton: Id,
}

const fn unset_radius() -> f64 {
    -1.0
}

impl TreeNodeFields {
    const fn into_record(self, pk: Id) -> TreeNode {
        TreeNode {
            id: pk,
            skeleton: self.skeleton,
            parent: self.parent,
            location: Point::new(self.location_x, self.location_y, self.location_z),
        }
    }
}

impl From<&TreeNode> for TreeNodeFields {
    fn from(node: &TreeNode) -> Self {
        Self {
            editor: None,
            location_x: node.location.x,
            location_y: node.location.y,
            location_z: node.location.z,
            parent: node.parent,
            radius: unset_radius(),
            confidence: 0,
            skeleton: node.skeleton,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TreeNodeLinkFields {
    relation: Id,
    treenode: Id,
    class_instance: Id,
}

impl TreeNodeLinkFields {
    const fn into_record(self, pk: Id) -> TreeNodeLink {
        TreeNodeLink {
            id: pk,
            relation: self.relation,
            treenode: self.treenode,
            instance: self.class_instance,
        }
    }
}

impl From<&TreeNodeLink> for TreeNodeLinkFields {
    fn from(link: &TreeNodeLink) -> Self {
        Self {
            relation: link.relation,
            treenode: link.treenode,
            class_instance: link.instance,
        }
    }
}

/// Reads a coordinate written either as an integer or a float, truncating
/// fractional values. Values outside the `i64` range are rejected.
#[allow(clippy::cast_possible_truncation)]
fn coordinate<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coordinate {
        Integer(i64),
        Float(f64),
    }

    // 2^63, the first float above `i64::MAX`
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    match Coordinate::deserialize(deserializer)? {
        Coordinate::Integer(value) => Ok(value),
        Coordinate::Float(value) => {
            let value = value.trunc();
            if (-LIMIT..LIMIT).contains(&value) {
                Ok(value as i64)
            } else {
                Err(de::Error::custom(format!("coordinate {value} is out of range")))
            }
        }
    }
}
