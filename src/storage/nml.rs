//! Reading and writing NML documents.
//!
//! An NML document is a root element holding `<thing>` elements (each with
//! `<nodes>` and `<edges>`) followed by an optional legacy `<comments>`
//! block. Elements and attributes not needed for conversion, such as
//! `<parameters>` or node radii, are ignored when reading.

use quick_xml::{Reader, events::Event};
use serde::{Deserialize, Serialize};

use crate::domain::{Comment, Edge, Id, Node, Point, Thing, Tracing};

/// The document shapes written by different tracing tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flavor {
    /// KNOSSOS documents, rooted at `<things>`.
    #[default]
    Knossos,
    /// PyKNOSSOS documents, rooted at `<nml>`.
    PyKnossos,
}

impl Flavor {
    /// The name of the root element.
    #[must_use]
    pub const fn root(self) -> &'static str {
        match self {
            Self::Knossos => "things",
            Self::PyKnossos => "nml",
        }
    }
}

/// Errors that can occur when reading or writing NML.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// The document does not have the expected structure.
    #[error("invalid NML document: {0}")]
    Parse(#[from] quick_xml::DeError),
    /// The tracing could not be serialized.
    #[error("failed to write NML: {0}")]
    Write(#[from] quick_xml::SeError),
    /// The root element does not match the requested flavor.
    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        /// The root element of the requested flavor.
        expected: &'static str,
        /// The root element found in the document.
        found: String,
    },
    /// The document contains no elements.
    #[error("document has no root element")]
    Empty,
}

/// Parses an NML document of the given flavor.
///
/// # Errors
///
/// Returns an error if the document is not well-formed, has the wrong root
/// element, or lacks required attributes.
pub fn from_str(xml: &str, flavor: Flavor) -> Result<Tracing, Error> {
    let found = root_element(xml)?;
    if found != flavor.root() {
        return Err(Error::UnexpectedRoot {
            expected: flavor.root(),
            found,
        });
    }

    let document: Document = quick_xml::de::from_str(xml)?;
    Ok(document.into())
}

/// Serializes a tracing as an NML document of the given flavor.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_string(tracing: &Tracing, flavor: Flavor) -> Result<String, Error> {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let mut serializer = quick_xml::se::Serializer::with_root(&mut xml, Some(flavor.root()))?;
    serializer.indent(' ', 1);
    Document::from(tracing).serialize(serializer)?;
    xml.push('\n');
    Ok(xml)
}

fn root_element(xml: &str) -> Result<String, Error> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element) => {
                return Ok(String::from_utf8_lossy(element.name().as_ref()).into_owned());
            }
            Event::Eof => return Err(Error::Empty),
            _ => {}
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(rename = "thing", default)]
    things: Vec<XmlThing>,
    #[serde(default, skip_serializing_if = "XmlComments::is_empty")]
    comments: XmlComments,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlThing {
    #[serde(rename = "@id")]
    id: Id,
    #[serde(rename = "@neuron_id", default, skip_serializing_if = "Option::is_none")]
    neuron_id: Option<Id>,
    #[serde(rename = "@skeleton_id", default, skip_serializing_if = "Option::is_none")]
    skeleton_id: Option<Id>,
    #[serde(default)]
    nodes: XmlNodes,
    #[serde(default)]
    edges: XmlEdges,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlNodes {
    #[serde(rename = "node", default)]
    nodes: Vec<XmlNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlNode {
    #[serde(rename = "@id")]
    id: Id,
    #[serde(rename = "@x")]
    x: i64,
    #[serde(rename = "@y")]
    y: i64,
    #[serde(rename = "@z")]
    z: i64,
    #[serde(rename = "@comment", default, skip_serializing_if = "String::is_empty")]
    comment: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlEdges {
    #[serde(rename = "edge", default)]
    edges: Vec<XmlEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlEdge {
    #[serde(rename = "@source")]
    source: Id,
    #[serde(rename = "@target")]
    target: Id,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct XmlComments {
    #[serde(rename = "comment", default)]
    comments: Vec<XmlComment>,
}

impl XmlComments {
    const fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlComment {
    #[serde(rename = "@node")]
    node: Id,
    #[serde(rename = "@content", default)]
    content: String,
}

impl From<Document> for Tracing {
    fn from(document: Document) -> Self {
        let things = document
            .things
            .into_iter()
            .map(|thing| Thing {
                id: thing.id,
                neuron_id: thing.neuron_id,
                skeleton_id: thing.skeleton_id,
                nodes: thing
                    .nodes
                    .nodes
                    .into_iter()
                    .map(|node| {
                        Node::new(node.id, Point::new(node.x, node.y, node.z))
                            .with_comment(node.comment)
                    })
                    .collect(),
                edges: thing
                    .edges
                    .edges
                    .into_iter()
                    .map(|edge| Edge::new(edge.source, edge.target))
                    .collect(),
            })
            .collect();

        let comments = document
            .comments
            .comments
            .into_iter()
            .map(|comment| Comment::new(comment.node, comment.content))
            .collect();

        Self { things, comments }
    }
}

impl From<&Tracing> for Document {
    fn from(tracing: &Tracing) -> Self {
        let things = tracing
            .things
            .iter()
            .map(|thing| XmlThing {
                id: thing.id,
                neuron_id: thing.neuron_id,
                skeleton_id: thing.skeleton_id,
                nodes: XmlNodes {
                    nodes: thing
                        .nodes
                        .iter()
                        .map(|node| XmlNode {
                            id: node.id,
                            x: node.position.x,
                            y: node.position.y,
                            z: node.position.z,
                            comment: node
                                .comment
                                .as_ref()
                                .map(ToString::to_string)
                                .unwrap_or_default(),
                        })
                        .collect(),
                },
                edges: XmlEdges {
                    edges: thing
                        .edges
                        .iter()
                        .map(|edge| XmlEdge {
                            source: edge.source,
                            target: edge.target,
                        })
                        .collect(),
                },
            })
            .collect();

        let comments = XmlComments {
            comments: tracing
                .comments
                .iter()
                .map(|comment| XmlComment {
                    node: comment.node,
                    content: comment.content.clone(),
                })
                .collect(),
        };

        Self { things, comments }
    }
}
