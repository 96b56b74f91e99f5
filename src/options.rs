use camino::Utf8PathBuf;

use crate::catalog::Catalog;
use crate::domain::{ElementSymbol, ModelPattern, Selection, Structure, full_match};
use crate::error::KimQueryError;

/// Unvalidated selection as supplied by the caller. `None` means "not
/// given" and falls back to the default for that field.
#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
    pub properties: Option<Vec<String>>,
    pub structures: Option<Vec<String>>,
    pub elements: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
    pub update: bool,
    pub cache: Option<Utf8PathBuf>,
}

/// Validated options for one update-and-filter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub properties: Vec<String>,
    pub structures: Vec<Structure>,
    pub elements: Selection<ElementSymbol>,
    pub models: Selection<ModelPattern>,
    pub force_refresh: bool,
    pub cache_path: Utf8PathBuf,
}

impl Options {
    pub fn resolve(
        args: QueryArgs,
        catalog: &Catalog,
        default_cache: Utf8PathBuf,
    ) -> Result<Self, KimQueryError> {
        let properties = match args.properties {
            Some(selectors) => resolve_properties(&non_empty(selectors, "properties")?, catalog)?,
            None => catalog.list_codes().into_iter().map(str::to_string).collect(),
        };

        let structures = match args.structures {
            Some(values) => dedup(
                non_empty(values, "structures")?
                    .iter()
                    .map(|value| value.parse())
                    .collect::<Result<Vec<Structure>, _>>()?,
            ),
            None => Structure::ALL.to_vec(),
        };

        let elements = match args.elements {
            Some(values) => Selection::Only(dedup(
                non_empty(values, "elements")?
                    .iter()
                    .map(|value| value.parse())
                    .collect::<Result<Vec<ElementSymbol>, _>>()?,
            )),
            None => Selection::All,
        };

        let models = match args.models {
            Some(values) => Selection::Only(dedup(
                non_empty(values, "models")?
                    .iter()
                    .map(|value| value.parse())
                    .collect::<Result<Vec<ModelPattern>, _>>()?,
            )),
            None => Selection::All,
        };

        Ok(Self {
            properties,
            structures,
            elements,
            models,
            force_refresh: args.update,
            cache_path: args.cache.unwrap_or(default_cache),
        })
    }

    pub fn wants_property(&self, code: &str) -> bool {
        self.properties.iter().any(|property| property == code)
    }

    pub fn wants_structure(&self, structure: &str) -> bool {
        self.structures
            .iter()
            .any(|candidate| candidate.as_str() == structure)
    }

    pub fn wants_element(&self, element: &str) -> bool {
        match &self.elements {
            Selection::All => true,
            Selection::Only(list) => list.iter().any(|symbol| symbol.as_str() == element),
        }
    }

    pub fn wants_model(&self, model: &str) -> bool {
        match &self.models {
            Selection::All => true,
            Selection::Only(patterns) => patterns.iter().any(|pattern| pattern.matches(model)),
        }
    }
}

/// Expands property selectors against the catalog. A selector is a code or
/// a regular expression that must match a whole code.
fn resolve_properties(
    selectors: &[String],
    catalog: &Catalog,
) -> Result<Vec<String>, KimQueryError> {
    let mut selected: Vec<String> = Vec::new();
    for selector in selectors {
        let selector = selector.trim();
        let matched: Vec<&str> = if catalog.contains(selector) {
            vec![selector]
        } else {
            let pattern = full_match(selector)
                .map_err(|_| KimQueryError::InvalidProperty(selector.to_string()))?;
            catalog
                .list_codes()
                .into_iter()
                .filter(|code| pattern.is_match(code))
                .collect()
        };
        if matched.is_empty() {
            return Err(KimQueryError::InvalidProperty(selector.to_string()));
        }
        for code in matched {
            if !selected.iter().any(|existing| existing == code) {
                selected.push(code.to_string());
            }
        }
    }
    Ok(selected)
}

fn non_empty(values: Vec<String>, what: &'static str) -> Result<Vec<String>, KimQueryError> {
    let values: Vec<String> = values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
    if values.is_empty() {
        return Err(KimQueryError::EmptySelection(what));
    }
    Ok(values)
}

fn dedup<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn strings(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|value| value.to_string()).collect())
    }

    #[test]
    fn defaults_select_everything() {
        let catalog = Catalog::builtin();
        let options =
            Options::resolve(QueryArgs::default(), &catalog, "cache.json".into()).unwrap();
        assert_eq!(options.properties.len(), catalog.list_codes().len());
        assert_eq!(options.structures, Structure::ALL.to_vec());
        assert!(options.elements.is_all());
        assert!(options.models.is_all());
        assert!(!options.force_refresh);
        assert_eq!(options.cache_path, "cache.json");
    }

    #[test]
    fn property_regex_expands_in_catalog_order() {
        let args = QueryArgs {
            properties: strings(&["c4.", "c1.", "c11"]),
            ..QueryArgs::default()
        };
        let options = Options::resolve(args, &Catalog::builtin(), "c.json".into()).unwrap();
        assert_eq!(options.properties, vec!["c44", "c11", "c12"]);
    }

    #[test]
    fn property_regex_must_match_whole_code() {
        let args = QueryArgs {
            properties: strings(&["c"]),
            ..QueryArgs::default()
        };
        let err = Options::resolve(args, &Catalog::builtin(), "c.json".into()).unwrap_err();
        assert_matches!(err, KimQueryError::InvalidProperty(selector) if selector == "c");
    }

    #[test]
    fn empty_selector_list_is_rejected() {
        let args = QueryArgs {
            elements: strings(&["", " "]),
            ..QueryArgs::default()
        };
        let err = Options::resolve(args, &Catalog::builtin(), "c.json".into()).unwrap_err();
        assert_matches!(err, KimQueryError::EmptySelection("elements"));
    }
}
