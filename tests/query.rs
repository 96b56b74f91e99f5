use kimquery::catalog::Catalog;
use kimquery::domain::Structure;
use kimquery::query;

#[test]
fn query_string_embeds_unescaped_json() {
    let catalog = Catalog::builtin();
    let spec = query::build("c11", Structure::Diamond, catalog.lookup("c11").unwrap()).unwrap();

    let encoded = spec.to_query_string();
    assert!(encoded.starts_with("flat=on&query={"));
    assert!(encoded.contains(r#""meta.runner.kimcode":{"$regex":"^ElasticConstantsCubic_diamond"}"#));
    assert!(encoded.contains(r#""meta.type":"tr""#));
    assert!(encoded.contains("&limit=0&fields={"));
    assert!(encoded.contains(r#""c11.source-std-uncert-value":1"#));
    assert!(encoded.ends_with("}&database=data"));
    assert!(!encoded.contains('%'));
    assert!(!encoded.contains(' '));
}

#[test]
fn url_joins_base_and_query() {
    let catalog = Catalog::builtin();
    let spec = query::build("vfe", Structure::Fcc, catalog.lookup("vfe").unwrap()).unwrap();
    let url = spec.url("https://query.openkim.org/api");
    assert!(url.starts_with("https://query.openkim.org/api?flat=on&query="));
}

#[test]
fn building_is_deterministic() {
    let catalog = Catalog::builtin();
    let meta = catalog.lookup("lc").unwrap();
    let first = query::build("lc", Structure::Sc, meta).unwrap();
    let second = query::build("lc", Structure::Sc, meta).unwrap();
    assert_eq!(first.to_query_string(), second.to_query_string());
}
