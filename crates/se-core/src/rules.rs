//! Rule documents.
//!
//! A rule document is a tree of kind-tagged nodes. Interpretation happens in
//! [`crate::interpreter`]; this module only gives the tree its shape, so any
//! node kind is accepted here and rejected later if it is unknown.
//!
//! # JSON form
//!
//! ```json
//! {
//!   "sources": [
//!     {
//!       "File": "capture.jsonl",
//!       "ops": [
//!         { "InsertTime": "Append" },
//!         { "Namespace": { "Name": "cpu*", "ops": [
//!             { "ScaleID": { "ID": "load", "Factor": "2", "Precision": 1 } },
//!             { "RenameNS": "host_*" }
//!         ] } },
//!         { "Trim": { "StartTime": 0, "EndTime": 500 } },
//!         { "RemoveNamespace": "debug" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Every node other than a source is a single-key object. A string (or
//! number) value is the node's text; an object value holds its attributes,
//! with children under `ops`. Write decimal literals as strings to keep
//! their digits: the JSON number `1.50` reads back as `1.5`.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::EditError;

const CHILDREN_KEY: &str = "ops";

/// One node of a rule tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleNode {
    pub kind: String,
    pub text: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Self>,
}

impl RuleNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn required_attr(&self, name: &'static str) -> Result<&str, EditError> {
        self.attr(name).ok_or_else(|| EditError::MissingAttribute {
            node: self.kind.clone(),
            attribute: name,
        })
    }

    /// The node's text, which must be present and non-blank.
    pub fn value(&self) -> Result<&str, EditError> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| EditError::MissingValue {
                node: self.kind.clone(),
            })
    }

    /// Children of the given kind, in document order.
    pub fn children_of<'a, 'k>(
        &'a self,
        kind: &'k str,
    ) -> impl Iterator<Item = &'a Self> + use<'a, 'k> {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    /// Errors if more than one child of `kind` is present.
    pub fn at_most_one(&self, kind: &str) -> Result<Option<&Self>, EditError> {
        let mut found = self.children_of(kind);
        let first = found.next();
        if found.next().is_some() {
            return Err(EditError::DuplicateNode {
                parent: self.kind.clone(),
                kind: kind.to_string(),
            });
        }
        Ok(first)
    }
}

/// A parsed rule document: one `Source` node per input snapshot, in
/// processing order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleDocument {
    pub sources: Vec<RuleNode>,
}

impl FromStr for RuleDocument {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let root: Value =
            serde_json::from_str(s).map_err(|e| EditError::Document(e.to_string()))?;
        let sources = root
            .get("sources")
            .and_then(Value::as_array)
            .ok_or_else(|| EditError::Document("expected a top-level \"sources\" array".into()))?;
        let sources = sources
            .iter()
            .map(|source| match source {
                Value::Object(map) => node_from_object("Source", map),
                _ => Err(EditError::Document("each source must be an object".into())),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { sources })
    }
}

fn node_from_object(kind: &str, map: &Map<String, Value>) -> Result<RuleNode, EditError> {
    let mut node = RuleNode::new(kind);
    for (key, value) in map {
        if key == CHILDREN_KEY {
            let Value::Array(items) = value else {
                return Err(EditError::Document(format!(
                    "<{kind}> \"{CHILDREN_KEY}\" must be an array"
                )));
            };
            for item in items {
                node.children.push(child_node(kind, item)?);
            }
        } else {
            let text = scalar_text(value).ok_or_else(|| {
                EditError::Document(format!("<{kind}> attribute {key} must be a string or number"))
            })?;
            node.attributes.insert(key.clone(), text);
        }
    }
    Ok(node)
}

fn child_node(parent: &str, item: &Value) -> Result<RuleNode, EditError> {
    let single = item
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.iter().next());
    let Some((kind, value)) = single else {
        return Err(EditError::Document(format!(
            "children of <{parent}> must be single-key objects"
        )));
    };
    match value {
        Value::Object(map) => node_from_object(kind, map),
        other => scalar_text(other)
            .map(|text| RuleNode::new(kind.as_str()).with_text(text))
            .ok_or_else(|| EditError::Document(format!("<{kind}> must be a value or an object"))),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
