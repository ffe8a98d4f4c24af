//! Typed annotation model.
//!
//! Annotations arrive from the schema front end as raw JSON-like payloads
//! attached to messages and fields. This module owns their typed shape and
//! the closed vocabularies (primitive types, binding sources) that the
//! planner relies on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Annotation key carrying the field-level encryption feature.
pub const MODEL_FEATURE: &str = "model_feature";
/// Annotation key carrying the parser/helper feature flags.
pub const PARSER: &str = "parser";
/// Annotation key carrying per-field merge/pick/binding metadata.
pub const FIELD_OPTION: &str = "field_option";

/// Marks an entity for field-level encryption through the keeper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CryptoFeature {
    /// Opaque key identifier handed to the keeper's transit operations.
    #[serde(rename = "keeper_key")]
    pub key_id: String,
}

/// Independent helper flags requested for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserFeature {
    #[serde(rename = "swag", alias = "swagger_wrapper")]
    pub swagger_wrapper: bool,
    pub paging: bool,
    pub list: bool,
    pub merge: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_from: Option<String>,
    pub pick: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pick_with: Option<String>,
    #[serde(rename = "fiber", alias = "request_binder")]
    pub request_binder: bool,
}

impl ParserFeature {
    /// Whether a merge function was requested, either explicitly or by naming
    /// a merge source.
    pub fn wants_merge(&self) -> bool {
        self.merge || self.merge_from.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Where the request binder reads a field from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingSource {
    Query,
    Body,
    Path,
    Context,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingSource::Query => write!(f, "query"),
            BindingSource::Body => write!(f, "body"),
            BindingSource::Path => write!(f, "path"),
            BindingSource::Context => write!(f, "context"),
        }
    }
}

/// Raw payload of the `field_option` annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldOption {
    pub merged: bool,
    pub picked: bool,
    pub source: Option<BindingSource>,
}

/// The closed set of field types understood by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Bool,
    String,
    Bytes,
    /// Another message, referenced by its local name.
    Embedded(String),
}

impl PrimitiveType {
    /// Resolve a descriptor type name.
    ///
    /// Accepts both `TYPE_UINT32` and `uint32` spellings. Message types need
    /// the referenced type name; only its last path segment is kept.
    /// Returns `None` for anything outside the vocabulary.
    pub fn from_descriptor(proto_type: &str, type_name: Option<&str>) -> Option<Self> {
        let normalized = proto_type
            .strip_prefix("TYPE_")
            .unwrap_or(proto_type)
            .to_ascii_lowercase();

        let primitive = match normalized.as_str() {
            "double" => PrimitiveType::Double,
            "float" => PrimitiveType::Float,
            "int32" => PrimitiveType::Int32,
            "int64" => PrimitiveType::Int64,
            "uint32" => PrimitiveType::Uint32,
            "uint64" => PrimitiveType::Uint64,
            "bool" => PrimitiveType::Bool,
            "string" => PrimitiveType::String,
            "bytes" => PrimitiveType::Bytes,
            "message" | "embedded" => {
                let name = type_name?.rsplit('.').next()?;
                if name.is_empty() {
                    return None;
                }
                PrimitiveType::Embedded(name.to_string())
            }
            _ => return None,
        };
        Some(primitive)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, PrimitiveType::Uint32 | PrimitiveType::Uint64)
    }

    /// Types a converted integer path parameter can be assigned to.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Double
                | PrimitiveType::Float
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::Uint32
                | PrimitiveType::Uint64
        )
    }

    /// Go spelling of the scalar type.
    pub fn go_type(&self) -> String {
        match self {
            PrimitiveType::Double => "float64".to_string(),
            PrimitiveType::Float => "float32".to_string(),
            PrimitiveType::Int32 => "int32".to_string(),
            PrimitiveType::Int64 => "int64".to_string(),
            PrimitiveType::Uint32 => "uint32".to_string(),
            PrimitiveType::Uint64 => "uint64".to_string(),
            PrimitiveType::Bool => "bool".to_string(),
            PrimitiveType::String => "string".to_string(),
            PrimitiveType::Bytes => "[]byte".to_string(),
            PrimitiveType::Embedded(name) => format!("*{name}"),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Embedded(name) => write!(f, "embedded({name})"),
            other => write!(f, "{}", other.go_type()),
        }
    }
}

/// One annotated field of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub primitive: PrimitiveType,
    pub repeated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<BindingSource>,
    pub merged: bool,
    pub picked: bool,
}

impl FieldSpec {
    /// Go spelling of the declared field type, including repetition.
    pub fn go_type(&self) -> String {
        if self.repeated {
            format!("[]{}", self.primitive.go_type())
        } else {
            self.primitive.go_type()
        }
    }
}

/// Entity-level annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityAnnotation {
    Crypto(CryptoFeature),
    Parser(ParserFeature),
}

/// Every annotation the aggregator understands, entity- or field-level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Entity(EntityAnnotation),
    Field(FieldSpec),
}
