use serde_json::{Value, json};

use crate::catalog::PropertyMeta;
use crate::domain::Structure;
use crate::error::KimQueryError;

pub const MODEL_FIELD: &str = "meta.model";
pub const SPECIES_FIELD: &str = "meta.runner.species";
pub const HOST_FIELD: &str = "host-short-name.source-value";

/// A remote query for one (property, structure) pair: the filter
/// expression and the projected fields.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub filter: Value,
    pub fields: Value,
    pub value_field: String,
    pub uncertainty_field: String,
}

impl QuerySpec {
    /// Encodes the query parameters. The embedded JSON is left unescaped;
    /// the query service parses it verbatim.
    pub fn to_query_string(&self) -> String {
        format!(
            "flat=on&query={}&limit=0&fields={}&database=data",
            self.filter, self.fields
        )
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}?{}", base_url.trim_end_matches('?'), self.to_query_string())
    }
}

pub fn build(
    property: &str,
    structure: Structure,
    meta: &PropertyMeta,
) -> Result<QuerySpec, KimQueryError> {
    if meta.code != property {
        return Err(KimQueryError::InvalidPropertyMeta {
            code: property.to_string(),
            reason: format!("metadata belongs to {}", meta.code),
        });
    }
    meta.validate()?;

    let filter = json!({
        "meta.type": "tr",
        "property-id": meta.remote_id,
        "meta.runner.kimcode": {
            "$regex": format!("^{}_{}", meta.driver_name, structure.as_str()),
        },
    });

    let mut fields = serde_json::Map::new();
    for key in [
        MODEL_FIELD,
        SPECIES_FIELD,
        HOST_FIELD,
        meta.value_field_key.as_str(),
        meta.uncertainty_field_key.as_str(),
    ] {
        fields.insert(key.to_string(), json!(1));
    }

    Ok(QuerySpec {
        filter,
        fields: Value::Object(fields),
        value_field: meta.value_field_key.clone(),
        uncertainty_field: meta.uncertainty_field_key.clone(),
    })
}
