//! End-to-end tests over the public API.

use std::sync::Arc;
use std::thread;

use ingot::ingest::{flatten, BuiltDocument};
use ingot::{
    ingest_ndjson, BuildContext, BulkWriter, DocumentBuilder, Field, FieldBinding, FieldType, FieldValue,
    FieldValueConverter, Index, IngestStats, IngotError, Mapping, PipelineConfig,
};
use serde_json::json;

fn person_index() -> Index {
    let mapping = Mapping::new("person")
        .with_field(Field::new("age", FieldType::Integer))
        .unwrap()
        .with_field(Field::new("tags", FieldType::Keyword))
        .unwrap()
        .with_field(Field::new("when", FieldType::Date).with_ignore_malformed(true))
        .unwrap()
        .with_field(Field::new("note", FieldType::Text))
        .unwrap();
    Index::new("people").with_mapping(mapping)
}

fn person_builder() -> DocumentBuilder {
    let binding = FieldBinding::new(
        &person_index(),
        "person",
        [("tags", "tags"), ("tags", "profile.labels")],
        ["age", "when", "note"],
    )
    .unwrap();
    DocumentBuilder::new(Arc::new(binding))
}

#[test]
fn test_trimmed_integer_is_written_as_scalar() {
    assert_eq!(person_builder().build(r#"{"age": " 42 "}"#).unwrap(), r#"{"age":"42"}"#);
}

#[test]
fn test_repeated_tags_are_collapsed() {
    let builder = person_builder();
    assert_eq!(builder.build(r#"{"tags":["x","x","y"]}"#).unwrap(), r#"{"tags":["x","y"]}"#);
    assert_eq!(
        builder.build(r#"{"tags":["b","a"],"profile":{"labels":["b","c"]}}"#).unwrap(),
        r#"{"tags":["b","a","c"]}"#
    );
}

#[test]
fn test_unparsable_tolerated_date_is_omitted() {
    assert_eq!(person_builder().build(r#"{"when":"not-a-date"}"#).unwrap(), "{}");
}

#[test]
fn test_dates_are_normalized_to_utc() {
    let line = person_builder().build(r#"{"when":"2024-03-05T10:00:00+02:00"}"#).unwrap();
    assert_eq!(line, r#"{"when":"2024-03-05T08:00:00.000Z"}"#);
}

#[test]
fn test_blank_and_null_values_leave_no_entry() {
    let line = person_builder()
        .build(r#"{"age":"   ","tags":[null,"",[null]],"note":null,"profile":{"labels":{}}}"#)
        .unwrap();
    assert_eq!(line, "{}");
}

#[test]
fn test_integer_overflow_aborts_build() {
    let err = person_builder().build(r#"{"age":"999999999999","tags":"kept?"}"#).unwrap_err();
    match err {
        IngotError::Malformed { field, value, .. } => {
            assert_eq!(field, "age");
            assert_eq!(value, "999999999999");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_output_is_always_one_line() {
    let line = person_builder()
        .build("{\"note\":\"first line\\nsecond line\",\"tags\":[\"a\\r\\nb\"]}")
        .unwrap();
    assert!(!line.contains('\n'));
    assert_eq!(line, r#"{"tags":"a\r\nb","note":"first line\nsecond line"}"#);
}

#[test]
fn test_reuse_matches_fresh_builds() {
    let inputs = [
        r#"{"age":1,"tags":["a","b"],"note":"one"}"#,
        r#"{"tags":"c"}"#,
        r#"{"age":"oops"}"#,
        r#"{"when":"2020-01-01","age":3}"#,
    ];

    let shared = person_builder();
    let mut ctx = BuildContext::new();
    for input in inputs {
        let reused = shared.build_with(&mut ctx, input).map_err(|e| e.to_string());
        let fresh = person_builder().build(input).map_err(|e| e.to_string());
        assert_eq!(reused, fresh, "input: {input}");
    }
}

#[test]
fn test_builder_is_shared_across_threads() {
    let builder = person_builder();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let builder = &builder;
                scope.spawn(move || {
                    let mut ctx = BuildContext::new();
                    for n in 0..50 {
                        let age = worker * 1000 + n;
                        let line = builder
                            .build_with(&mut ctx, &format!(r#"{{"age":{age},"tags":["w{worker}"]}}"#))
                            .unwrap();
                        assert_eq!(line, format!(r#"{{"tags":"w{worker}","age":"{age}"}}"#));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    });
}

#[test]
fn test_unknown_field_is_a_configuration_error() {
    let err = FieldBinding::new(&person_index(), "person", [("nickname", "nick")], ["age"]).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, IngotError::UnknownField { ref field, .. } if field == "nickname"));
}

#[test]
fn test_typed_conversion_over_a_tree() {
    let field = Field::new("scores", FieldType::Double);
    let tree = json!({"a": [1.5, null, {"b": "2.25"}], "c": "  "});

    let values = FieldValueConverter::new().convert_all(&field, &tree).unwrap();
    assert_eq!(values, vec![FieldValue::Float(1.5), FieldValue::Float(2.25)]);

    let leaves = flatten(&tree, &field).unwrap();
    assert_eq!(leaves, vec!["1.5", "2.25", "  "]);
}

const LIBRARY_CONFIG: &str = r#"{
    "index": {
        "name": "library",
        "mappings": {
            "book": {"fields": [
                {"name": "isbn", "type": "keyword"},
                {"name": "title", "type": "text", "include_in_aggregate": true},
                {"name": "published", "type": "date", "ignore_malformed": true},
                {"name": "words", "type": "integer"},
                {"name": "years", "type": "keyword"}
            ]}
        }
    },
    "doc_type": "book",
    "fields": [{"field": "title", "paths": ["title"]}],
    "identity_fields": ["isbn", "published"],
    "id_field": "isbn",
    "date_parsing": "text_or_epoch",
    "enrichers": [
        {"kind": "token_count", "field": "words"},
        {"kind": "regex_extract", "field": "years", "pattern": "\\b\\d{4}\\b"}
    ]
}"#;

#[test]
fn test_configured_pipeline_writes_bulk_payload() {
    let config = PipelineConfig::from_json(LIBRARY_CONFIG).unwrap();
    let builder = config.builder().unwrap();

    let input = concat!(
        r#"{"isbn":"1","title":"Dune 1965","published":"1965-08-01"}"#,
        "\n\n",
        r#"{"isbn":"2","title":"Emma","published":"someday"}"#,
        "\n",
        r#"{"isbn":"3","published":1700000000}"#,
        "\n",
    );

    let mut writer = BulkWriter::new(Vec::new(), config.index.name());
    let stats = ingest_ndjson(input.as_bytes(), &builder, &mut writer, false).unwrap();
    assert_eq!(stats, IngestStats { built: 3, skipped: 0 });
    assert_eq!(writer.written(), 3);

    let output = String::from_utf8(writer.into_inner()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"index":{"_index":"library","_id":"1"}}"#,
            r#"{"title":"Dune 1965","isbn":"1","published":"1965-08-01T00:00:00.000Z","words":"2","years":"1965"}"#,
            r#"{"index":{"_index":"library","_id":"2"}}"#,
            r#"{"title":"Emma","isbn":"2","words":"1"}"#,
            r#"{"index":{"_index":"library","_id":"3"}}"#,
            r#"{"isbn":"3","published":"2023-11-14T22:13:20.000Z","words":"0"}"#,
        ]
    );
}

#[test]
fn test_build_reports_document_id() {
    let config = PipelineConfig::from_json(LIBRARY_CONFIG).unwrap();
    let builder = config.builder().unwrap();

    let built = builder
        .build_entry_with(&mut BuildContext::new(), r#"{"isbn":" 978 ","title":"x"}"#)
        .unwrap();
    assert_eq!(
        built,
        BuiltDocument {
            id: Some("978".to_string()),
            line: r#"{"title":"x","isbn":"978","words":"1"}"#.to_string(),
        }
    );
}
