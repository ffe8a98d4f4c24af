//! Schema front end.
//!
//! The aggregator reads schemas through the [`SchemaEntity`] and
//! [`SchemaField`] traits. [`DescriptorSet`] is the bundled implementation:
//! protobuf message descriptors with their option values, serialized as JSON
//! or YAML (the shape `protoc --descriptor_set_out` data takes once the
//! custom options have been decoded).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::AnnotationReadError;

/// Read access to one field of an entity.
pub trait SchemaField {
    fn name(&self) -> &str;

    /// Descriptor type name, e.g. `TYPE_STRING` or `string`.
    fn proto_type(&self) -> &str;

    /// Referenced message for embedded fields.
    fn type_name(&self) -> Option<&str>;

    fn is_repeated(&self) -> bool;

    /// Raw annotation payload, `None` when absent.
    fn raw_annotation(&self, key: &str) -> Option<&Value>;

    /// Typed annotation lookup: absent, present, or malformed.
    fn annotation<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AnnotationReadError>
    where
        Self: Sized,
    {
        read_annotation(self.raw_annotation(key), key)
    }
}

/// Read access to one entity (message), nested or top level.
pub trait SchemaEntity {
    type Field: SchemaField;

    /// Name as declared, without any parent prefix.
    fn local_name(&self) -> &str;

    /// Fully-qualified name; distinct entities never share one.
    fn full_name(&self) -> &str;

    /// Local name of the enclosing entity for nested entities.
    fn parent_name(&self) -> Option<&str>;

    /// Fully-qualified name of the enclosing entity for nested entities.
    fn parent_full_name(&self) -> Option<&str>;

    /// Fields in declaration order.
    fn fields(&self) -> &[Self::Field];

    fn raw_annotation(&self, key: &str) -> Option<&Value>;

    fn annotation<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AnnotationReadError>
    where
        Self: Sized,
    {
        read_annotation(self.raw_annotation(key), key)
    }
}

// `null` payloads are treated like missing ones.
fn read_annotation<T: DeserializeOwned>(
    raw: Option<&Value>,
    key: &str,
) -> Result<Option<T>, AnnotationReadError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| AnnotationReadError {
                annotation: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Errors loading a descriptor document.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON descriptor: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML descriptor: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A set of schema files, one generation run per file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

impl DescriptorSet {
    pub fn from_json(text: &str) -> Result<Self, DescriptorError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self, DescriptorError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a descriptor document; `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }
}

/// One schema file (compilation unit).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Path of the schema file, e.g. `shop/v1/jeton.proto`.
    pub name: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
}

impl FileDescriptor {
    /// Every message of the file, parents before their nested messages.
    pub fn entities(&self) -> Vec<EntityRef<'_>> {
        let mut out = Vec::new();
        for message in &self.messages {
            let full_name = qualify(&self.package, &message.name);
            collect(message, full_name, None, &mut out);
        }
        out
    }
}

fn collect<'a>(
    message: &'a MessageDescriptor,
    full_name: String,
    parent: Option<(&'a str, String)>,
    out: &mut Vec<EntityRef<'a>>,
) {
    out.push(EntityRef {
        message,
        full_name: full_name.clone(),
        parent,
    });
    for nested in &message.nested {
        let nested_full = qualify(&full_name, &nested.name);
        collect(
            nested,
            nested_full,
            Some((message.name.as_str(), full_name.clone())),
            out,
        );
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

/// A message declaration with its options and nested messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub nested: Vec<MessageDescriptor>,
    /// Decoded custom options keyed by annotation name.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

/// A field declaration with its options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub proto_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

impl SchemaField for FieldDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn proto_type(&self) -> &str {
        &self.proto_type
    }

    fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    fn is_repeated(&self) -> bool {
        self.repeated
    }

    fn raw_annotation(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

/// A message positioned in its file: qualified name and enclosing message.
#[derive(Debug, Clone)]
pub struct EntityRef<'a> {
    message: &'a MessageDescriptor,
    full_name: String,
    parent: Option<(&'a str, String)>,
}

impl SchemaEntity for EntityRef<'_> {
    type Field = FieldDescriptor;

    fn local_name(&self) -> &str {
        &self.message.name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn parent_name(&self) -> Option<&str> {
        self.parent.as_ref().map(|(name, _)| *name)
    }

    fn parent_full_name(&self) -> Option<&str> {
        self.parent.as_ref().map(|(_, full)| full.as_str())
    }

    fn fields(&self) -> &[FieldDescriptor] {
        &self.message.fields
    }

    fn raw_annotation(&self, key: &str) -> Option<&Value> {
        self.message.options.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{ParserFeature, PARSER};

    const YAML: &str = r#"
files:
  - name: shop/v1/jeton.proto
    package: shop.v1
    messages:
      - name: JetonListResponse
        options:
          parser: { pick: true, list: true, pick_with: JetonEntity }
        nested:
          - name: ListEntity
            fields:
              - { name: id, type: TYPE_STRING, options: { field_option: { picked: true } } }
      - name: JetonEntity
        fields:
          - { name: id, type: TYPE_STRING }
"#;

    #[test]
    fn test_entities_in_nesting_order() {
        let set = DescriptorSet::from_yaml(YAML).unwrap();
        let entities = set.files[0].entities();
        let names: Vec<&str> = entities.iter().map(|e| e.full_name()).collect();
        assert_eq!(
            names,
            vec![
                "shop.v1.JetonListResponse",
                "shop.v1.JetonListResponse.ListEntity",
                "shop.v1.JetonEntity"
            ]
        );
        assert_eq!(entities[1].parent_name(), Some("JetonListResponse"));
        assert_eq!(
            entities[1].parent_full_name(),
            Some("shop.v1.JetonListResponse")
        );
        assert_eq!(entities[0].parent_name(), None);
    }

    #[test]
    fn test_typed_lookup_distinguishes_absent_present_malformed() {
        let mut message = MessageDescriptor {
            name: "Thing".to_string(),
            ..Default::default()
        };
        let file = FileDescriptor {
            name: "thing.proto".to_string(),
            package: String::new(),
            messages: vec![message.clone()],
        };
        let entities = file.entities();
        let absent: Option<ParserFeature> = entities[0].annotation(PARSER).unwrap();
        assert!(absent.is_none());

        message
            .options
            .insert(PARSER.to_string(), serde_json::json!({ "paging": true }));
        let file = FileDescriptor {
            messages: vec![message.clone()],
            ..file
        };
        let present: Option<ParserFeature> = file.entities()[0].annotation(PARSER).unwrap();
        assert!(present.unwrap().paging);

        message
            .options
            .insert(PARSER.to_string(), serde_json::json!({ "paging": "yes" }));
        let file = FileDescriptor {
            messages: vec![message],
            ..file
        };
        let err = file.entities()[0]
            .annotation::<ParserFeature>(PARSER)
            .unwrap_err();
        assert_eq!(err.annotation, PARSER);
    }

    #[test]
    fn test_null_payload_is_absent() {
        let field = FieldDescriptor {
            name: "id".to_string(),
            proto_type: "string".to_string(),
            options: BTreeMap::from([("field_option".to_string(), Value::Null)]),
            ..Default::default()
        };
        let lookup: Option<crate::annotation::FieldOption> =
            field.annotation("field_option").unwrap();
        assert!(lookup.is_none());
    }

    #[test]
    fn test_json_and_yaml_documents_agree() {
        let from_yaml = DescriptorSet::from_yaml(YAML).unwrap();
        let json = serde_json::to_string(&from_yaml).unwrap();
        let from_json = DescriptorSet::from_json(&json).unwrap();
        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn test_load_picks_parser_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("schema.yaml");
        std::fs::write(&yaml_path, YAML).unwrap();
        let set = DescriptorSet::load(&yaml_path).unwrap();
        assert_eq!(set.files.len(), 1);

        let json_path = dir.path().join("schema.json");
        std::fs::write(&json_path, "{ \"files\": [] }").unwrap();
        assert!(DescriptorSet::load(&json_path).unwrap().files.is_empty());

        let missing = DescriptorSet::load(&dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(DescriptorError::Io { .. })));
    }
}
