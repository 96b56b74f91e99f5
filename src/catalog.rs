use std::fs;

use camino::Utf8Path;
use serde::Deserialize;

use crate::domain::Structure;
use crate::error::KimQueryError;

const PROPERTY_TAG: &str = "tag:staff@noreply.openkim.org,2014-04-15:property/";
const CUBIC: &[Structure] = &[
    Structure::Fcc,
    Structure::Bcc,
    Structure::Sc,
    Structure::Diamond,
];
const HCP: &[Structure] = &[Structure::Hcp];
const FCC: &[Structure] = &[Structure::Fcc];

/// Remote query metadata for one property code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMeta {
    pub code: String,
    pub remote_id: String,
    pub driver_name: String,
    pub property_key: String,
    pub value_field_key: String,
    pub uncertainty_field_key: String,
    /// When set, the driver only produces these structures.
    pub applicable_structures: Option<Vec<Structure>>,
}

impl PropertyMeta {
    fn builtin(
        code: &str,
        remote_name: &str,
        driver_name: &str,
        property_key: &str,
        structures: Option<&[Structure]>,
    ) -> Self {
        Self {
            code: code.to_string(),
            remote_id: format!("{PROPERTY_TAG}{remote_name}"),
            driver_name: driver_name.to_string(),
            property_key: property_key.to_string(),
            value_field_key: value_key(property_key),
            uncertainty_field_key: uncert_key(property_key),
            applicable_structures: structures.map(|list| list.to_vec()),
        }
    }

    pub fn validate(&self) -> Result<(), KimQueryError> {
        let missing = [
            ("remote id", &self.remote_id),
            ("driver name", &self.driver_name),
            ("value field key", &self.value_field_key),
            ("uncertainty field key", &self.uncertainty_field_key),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());
        if let Some((field, _)) = missing {
            return Err(KimQueryError::InvalidPropertyMeta {
                code: self.code.clone(),
                reason: format!("missing {field}"),
            });
        }
        if matches!(&self.applicable_structures, Some(list) if list.is_empty()) {
            return Err(KimQueryError::InvalidPropertyMeta {
                code: self.code.clone(),
                reason: "empty structure list".to_string(),
            });
        }
        Ok(())
    }
}

fn value_key(property_key: &str) -> String {
    format!("{property_key}.source-value")
}

fn uncert_key(property_key: &str) -> String {
    format!("{property_key}.source-std-uncert-value")
}

/// One entry of a catalog file, keyed by property code.
#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "property-id")]
    pub property_id: String,
    #[serde(rename = "test-driver")]
    pub test_driver: String,
    #[serde(rename = "property-key", default)]
    pub property_key: Option<String>,
    #[serde(rename = "value-key", default)]
    pub value_key: Option<String>,
    #[serde(rename = "uncert-key", default)]
    pub uncert_key: Option<String>,
    #[serde(default)]
    pub structures: Option<String>,
}

impl CatalogEntry {
    fn into_meta(self, code: String) -> Result<PropertyMeta, KimQueryError> {
        let property_key = self.property_key.unwrap_or_default();
        let field_key = |explicit: Option<String>, make: fn(&str) -> String| {
            explicit.unwrap_or_else(|| {
                if property_key.is_empty() {
                    String::new()
                } else {
                    make(&property_key)
                }
            })
        };
        let value_field_key = field_key(self.value_key, value_key);
        let uncertainty_field_key = field_key(self.uncert_key, uncert_key);

        let applicable_structures = self
            .structures
            .map(|list| {
                list.split(',')
                    .filter(|item| !item.trim().is_empty())
                    .map(str::parse::<Structure>)
                    .collect::<Result<Vec<Structure>, _>>()
            })
            .transpose()
            .map_err(|err| KimQueryError::InvalidPropertyMeta {
                code: code.clone(),
                reason: err.to_string(),
            })?;

        let meta = PropertyMeta {
            code,
            remote_id: self.property_id,
            driver_name: self.test_driver,
            property_key,
            value_field_key,
            uncertainty_field_key,
            applicable_structures,
        };
        meta.validate()?;
        Ok(meta)
    }
}

/// Static registry of the properties that can be queried. Read-only once
/// built.
#[derive(Debug, Clone)]
pub struct Catalog {
    properties: Vec<PropertyMeta>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let properties = vec![
            PropertyMeta::builtin(
                "lc",
                "structure-cubic-crystal-npt",
                "LatticeConstantCubicEnergy",
                "a",
                Some(CUBIC),
            ),
            PropertyMeta::builtin(
                "lc-hcp-a",
                "structure-hexagonal-crystal-npt",
                "LatticeConstantHexagonalEnergy",
                "a",
                Some(HCP),
            ),
            PropertyMeta::builtin(
                "lc-hcp-c",
                "structure-hexagonal-crystal-npt",
                "LatticeConstantHexagonalEnergy",
                "c",
                Some(HCP),
            ),
            PropertyMeta::builtin(
                "ce",
                "cohesive-potential-energy-cubic-crystal",
                "LatticeConstantCubicEnergy",
                "cohesive-potential-energy",
                Some(CUBIC),
            ),
            PropertyMeta::builtin(
                "c11",
                "elastic-constants-isothermal-cubic-crystal-npt",
                "ElasticConstantsCubic",
                "c11",
                Some(CUBIC),
            ),
            PropertyMeta::builtin(
                "c12",
                "elastic-constants-isothermal-cubic-crystal-npt",
                "ElasticConstantsCubic",
                "c12",
                Some(CUBIC),
            ),
            PropertyMeta::builtin(
                "c44",
                "elastic-constants-isothermal-cubic-crystal-npt",
                "ElasticConstantsCubic",
                "c44",
                Some(CUBIC),
            ),
            PropertyMeta::builtin(
                "vfe",
                "monovacancy-neutral-relaxed-formation-potential-energy-crystal-npt",
                "VacancyFormationEnergyRelaxationVolume",
                "relaxed-formation-potential-energy",
                None,
            ),
            PropertyMeta::builtin(
                "vme",
                "monovacancy-neutral-migration-energy-crystal-npt",
                "VacancyFormationMigration",
                "vacancy-migration-energy",
                None,
            ),
            PropertyMeta::builtin(
                "isfe",
                "intrinsic-stacking-fault-relaxed-energy-fcc-crystal-npt",
                "StackingFaultFccCrystal",
                "intrinsic-stacking-fault-energy",
                Some(FCC),
            ),
        ];
        Self { properties }
    }

    /// Parses a catalog file: a JSON object keyed by property code.
    /// Codes are ordered by name.
    pub fn from_json(content: &str) -> Result<Self, KimQueryError> {
        let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)
            .map_err(|err| KimQueryError::CatalogParse(err.to_string()))?;
        let properties = entries
            .into_iter()
            .map(|(code, value)| {
                let entry: CatalogEntry = serde_json::from_value(value)
                    .map_err(|err| KimQueryError::CatalogParse(format!("{code}: {err}")))?;
                entry.into_meta(code)
            })
            .collect::<Result<Vec<_>, KimQueryError>>()?;
        if properties.is_empty() {
            return Err(KimQueryError::CatalogParse("catalog is empty".to_string()));
        }
        Ok(Self { properties })
    }

    pub fn load(path: &Utf8Path) -> Result<Self, KimQueryError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| KimQueryError::CatalogRead(path.as_std_path().to_path_buf()))?;
        Self::from_json(&content)
    }

    pub fn lookup(&self, code: &str) -> Result<&PropertyMeta, KimQueryError> {
        self.properties
            .iter()
            .find(|meta| meta.code == code)
            .ok_or_else(|| KimQueryError::UnknownProperty(code.to_string()))
    }

    pub fn list_codes(&self) -> Vec<&str> {
        self.properties
            .iter()
            .map(|meta| meta.code.as_str())
            .collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.properties.iter().any(|meta| meta.code == code)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn builtin_entries_are_valid() {
        let catalog = Catalog::builtin();
        for code in catalog.list_codes() {
            catalog.lookup(code).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn lookup_unknown_code() {
        let err = Catalog::builtin().lookup("nope").unwrap_err();
        assert_matches!(err, KimQueryError::UnknownProperty(code) if code == "nope");
    }

    #[test]
    fn derived_field_keys() {
        let catalog = Catalog::builtin();
        let meta = catalog.lookup("vfe").unwrap();
        assert_eq!(
            meta.value_field_key,
            "relaxed-formation-potential-energy.source-value"
        );
        assert_eq!(
            meta.uncertainty_field_key,
            "relaxed-formation-potential-energy.source-std-uncert-value"
        );
        assert!(meta.applicable_structures.is_none());
    }
}
