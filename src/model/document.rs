//! Extraction of identifiers and dependency edges from DTDL documents.
//!
//! Only the fields needed for resolution are inspected: the model's own
//! `@id`, its `extends` references and the schemas of its `Component`
//! contents. The rest of the document is passed through untouched.

use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::dtmi::{Dtmi, DtmiError};

const ID_FIELD: &str = "@id";
const TYPE_FIELD: &str = "@type";
const EXTENDS_FIELD: &str = "extends";
const CONTENTS_FIELD: &str = "contents";
const SCHEMA_FIELD: &str = "schema";
const COMPONENT_TYPE: &str = "Component";

/// Errors raised while reading a fetched document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("expected a JSON array of models")]
    NotAnArray,

    #[error("missing '@id'")]
    MissingId,

    #[error("field '{0}' has an unexpected shape")]
    InvalidField(&'static str),

    #[error(transparent)]
    InvalidDtmi(#[from] DtmiError),

    #[error("document declares '@id' {found}, expected {expected}")]
    IdMismatch { expected: Dtmi, found: Dtmi },
}

/// Identity and declared dependencies of a single model document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelMetadata {
    pub id: Dtmi,
    /// Dependencies in declaration order; duplicates are kept.
    pub dependencies: Vec<Dtmi>,
}

/// Parse a single (non-expanded) model document.
pub fn parse_model(document: &str) -> Result<ModelMetadata, DocumentError> {
    let root: Value = serde_json::from_str(document)?;
    let object = root.as_object().ok_or(DocumentError::NotAnObject)?;

    let id = read_id(object)?;
    let mut dependencies = Vec::new();
    collect_dependencies(object, &mut dependencies)?;

    Ok(ModelMetadata { id, dependencies })
}

/// Split an expanded document into `(id, raw model text)` pairs.
///
/// Entries keep their original JSON text byte for byte. Duplicate ids are
/// returned as-is; the caller decides which one wins.
pub fn parse_expanded(document: &str) -> Result<Vec<(Dtmi, String)>, DocumentError> {
    let root: &RawValue = serde_json::from_str(document)?;
    if !root.get().trim_start().starts_with('[') {
        return Err(DocumentError::NotAnArray);
    }

    let entries: Vec<&RawValue> = serde_json::from_str(root.get())?;
    entries
        .into_iter()
        .map(|entry| {
            let value: Value = serde_json::from_str(entry.get())?;
            let object = value.as_object().ok_or(DocumentError::NotAnObject)?;
            Ok((read_id(object)?, entry.get().to_string()))
        })
        .collect()
}

fn read_id(object: &Map<String, Value>) -> Result<Dtmi, DocumentError> {
    match object.get(ID_FIELD) {
        Some(Value::String(id)) => Ok(Dtmi::parse(id)?),
        Some(_) => Err(DocumentError::InvalidField(ID_FIELD)),
        None => Err(DocumentError::MissingId),
    }
}

fn collect_dependencies(
    object: &Map<String, Value>,
    dependencies: &mut Vec<Dtmi>,
) -> Result<(), DocumentError> {
    match object.get(EXTENDS_FIELD) {
        Some(Value::Array(items)) => {
            for item in items {
                collect_reference(item, EXTENDS_FIELD, dependencies)?;
            }
        }
        Some(other) => collect_reference(other, EXTENDS_FIELD, dependencies)?,
        None => {}
    }

    if let Some(contents) = object.get(CONTENTS_FIELD) {
        let items = contents
            .as_array()
            .ok_or(DocumentError::InvalidField(CONTENTS_FIELD))?;

        for element in items.iter().filter_map(Value::as_object) {
            if !is_component(element) {
                continue;
            }
            if let Some(schema) = element.get(SCHEMA_FIELD) {
                collect_reference(schema, SCHEMA_FIELD, dependencies)?;
            }
        }
    }

    Ok(())
}

/// A reference is either a DTMI string or an inline interface definition
/// whose own references count as dependencies of the enclosing model.
fn collect_reference(
    value: &Value,
    field: &'static str,
    dependencies: &mut Vec<Dtmi>,
) -> Result<(), DocumentError> {
    match value {
        Value::String(reference) => {
            dependencies.push(Dtmi::parse(reference)?);
            Ok(())
        }
        Value::Object(inline) => collect_dependencies(inline, dependencies),
        _ => Err(DocumentError::InvalidField(field)),
    }
}

fn is_component(element: &Map<String, Value>) -> bool {
    match element.get(TYPE_FIELD) {
        Some(Value::String(kind)) => kind == COMPONENT_TYPE,
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some(COMPONENT_TYPE)),
        _ => false,
    }
}
