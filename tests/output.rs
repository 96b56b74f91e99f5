use kimquery::dataset::Dataset;
use kimquery::output::{OutputFormat, render, render_csv};

#[test]
fn csv_single_cell() {
    let dataset: Dataset =
        serde_json::from_str(r#"{"vfe":{"fcc":{"Al":{"MO_X":{"value":1.0,"uncert":0.1}}}}}"#)
            .unwrap();
    assert_eq!(
        render_csv(&dataset),
        "elem,model,vfe#fcc,vfe#fcc_std\nAl,MO_X,1.0,0.1"
    );
}

#[test]
fn csv_fills_absent_cells_with_dash() {
    let dataset: Dataset = serde_json::from_str(
        r#"{
            "lc": {"fcc": {"Al": {"MO_A": {"value": 4.05, "uncert": 0.002}}}},
            "vfe": {
                "bcc": {"Fe": {"MO_B": {"value": 1.9, "uncert": null}}},
                "fcc": {"Al": {"MO_A": {"value": 0.7, "uncert": 0.01}}}
            }
        }"#,
    )
    .unwrap();

    let csv = render_csv(&dataset);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "elem,model,lc#fcc,lc#fcc_std,vfe#bcc,vfe#bcc_std,vfe#fcc,vfe#fcc_std",
            "Al,MO_A,4.05,0.002,-,-,0.7,0.01",
            "Fe,MO_B,-,-,1.9,-,-,-",
        ]
    );
}

#[test]
fn json_is_pretty_printed_dataset() {
    let dataset: Dataset =
        serde_json::from_str(r#"{"vfe":{"fcc":{"Al":{"MO_X":{"value":1.0,"uncert":0.1}}}}}"#)
            .unwrap();
    let rendered = render(&dataset, OutputFormat::Json).unwrap();
    assert!(rendered.contains("\n  \"vfe\": {"));
    let reparsed: Dataset = serde_json::from_str(&rendered).unwrap();
    assert_eq!(reparsed, dataset);
}
