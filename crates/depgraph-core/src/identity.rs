//! Composite node identity.
//!
//! A node is identified by its resource type plus resource id. The string key
//! form is `type-id`; a literal `-` or `\` inside either component is escaped
//! with a backslash so the first unescaped `-` is always the delimiter and
//! [`parse_id`] inverts [`generate_id`] for every input.

use crate::error::IdentityError;
use crate::{Edge, ResourceItem, ResourceType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ID_DELIMITER: char = '-';
const ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NodeId {
    pub resource_type: ResourceType,
    pub resource_id: String,
}

impl NodeId {
    pub fn new(resource_type: ResourceType, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.normalized(),
            resource_id: resource_id.into(),
        }
    }

    pub fn source_of(edge: &Edge) -> Self {
        Self::new(
            edge.source_resource_type.clone(),
            edge.source_resource_id.clone(),
        )
    }

    pub fn destination_of(edge: &Edge) -> Self {
        Self::new(
            edge.destination_resource_type.clone(),
            edge.destination_resource_id.clone(),
        )
    }

    /// String key used by the rendering surface.
    pub fn key(&self) -> String {
        generate_id(&self.resource_type, &self.resource_id)
    }

    pub fn parse(key: &str) -> Result<Self, IdentityError> {
        parse_id(key)
    }
}

impl From<&ResourceItem> for NodeId {
    fn from(item: &ResourceItem) -> Self {
        Self::new(item.resource_type.clone(), item.id.clone())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for NodeId {
    type Err = IdentityError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        parse_id(key)
    }
}

impl From<NodeId> for String {
    fn from(value: NodeId) -> Self {
        value.key()
    }
}

impl TryFrom<String> for NodeId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_id(&value)
    }
}

fn escape_into(out: &mut String, raw: &str) {
    for ch in raw.chars() {
        if ch == ESCAPE || ch == ID_DELIMITER {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}

pub fn generate_id(resource_type: &ResourceType, resource_id: &str) -> String {
    let type_str = resource_type.as_str();
    let mut key = String::with_capacity(type_str.len() + resource_id.len() + 1);
    escape_into(&mut key, type_str);
    key.push(ID_DELIMITER);
    escape_into(&mut key, resource_id);
    key
}

/// Inverse of [`generate_id`].
///
/// An unescaped `-` after the delimiter is taken literally, so legacy keys such
/// as `app-my-service` still parse with id `my-service`.
pub fn parse_id(key: &str) -> Result<NodeId, IdentityError> {
    let mut type_part = String::new();
    let mut id_part = String::new();
    let mut seen_delimiter = false;
    let mut chars = key.chars();

    while let Some(ch) = chars.next() {
        let target = if seen_delimiter {
            &mut id_part
        } else {
            &mut type_part
        };
        match ch {
            ESCAPE => match chars.next() {
                Some(escaped) => target.push(escaped),
                None => return Err(IdentityError::DanglingEscape(key.to_string())),
            },
            ID_DELIMITER if !seen_delimiter => seen_delimiter = true,
            _ => target.push(ch),
        }
    }

    if !seen_delimiter {
        return Err(IdentityError::MissingDelimiter(key.to_string()));
    }
    if type_part.is_empty() {
        return Err(IdentityError::EmptyType(key.to_string()));
    }

    Ok(NodeId::new(ResourceType::from(type_part), id_part))
}
