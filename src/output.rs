use std::collections::BTreeMap;

use clap::ValueEnum;

use crate::dataset::{Dataset, Measurement};
use crate::error::KimQueryError;

pub const UNCERT_SUFFIX: &str = "_std";
const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

pub fn render(dataset: &Dataset, format: OutputFormat) -> Result<String, KimQueryError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(dataset)
            .map_err(|err| KimQueryError::Render(err.to_string())),
        OutputFormat::Csv => Ok(render_csv(dataset)),
    }
}

/// Pivots the dataset: one row per `element#model`, one value and one
/// uncertainty column per `property#structure`. Absent cells are `-`.
pub fn render_csv(dataset: &Dataset) -> String {
    let mut header = vec!["elem".to_string(), "model".to_string()];
    let mut columns = 0usize;
    let mut table: BTreeMap<(&str, &str), BTreeMap<usize, &Measurement>> = BTreeMap::new();

    for (property, structures) in dataset.properties() {
        for (structure, chunk) in structures {
            let column = format!("{property}#{structure}");
            header.push(column.clone());
            header.push(format!("{column}{UNCERT_SUFFIX}"));
            for (element, models) in chunk {
                for (model, measurement) in models {
                    table
                        .entry((element.as_str(), model.as_str()))
                        .or_default()
                        .insert(columns, measurement);
                }
            }
            columns += 1;
        }
    }

    let mut lines = vec![header.join(",")];
    for ((element, model), cells) in &table {
        let mut row = vec![element.to_string(), model.to_string()];
        for column in 0..columns {
            match cells.get(&column) {
                Some(measurement) => {
                    row.push(format_number(measurement.value));
                    row.push(format_number(measurement.uncert));
                }
                None => {
                    row.push(MISSING.to_string());
                    row.push(MISSING.to_string());
                }
            }
        }
        lines.push(row.join(","));
    }
    lines.join("\n")
}

fn format_number(value: Option<f64>) -> String {
    match value {
        Some(number) => format!("{number:?}"),
        None => MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_keep_a_decimal_point() {
        assert_eq!(format_number(Some(1.0)), "1.0");
        assert_eq!(format_number(Some(0.1)), "0.1");
        assert_eq!(format_number(None), "-");
    }

    #[test]
    fn empty_dataset_has_only_header() {
        assert_eq!(render_csv(&Dataset::new()), "elem,model");
    }
}
