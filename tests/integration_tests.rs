use ctf_format::{
    analyze, choose_delimiter, ctf, decode, decode_with_options, encode, encode_with_options,
    get_stats, DecodeOptions, Delimiter, EncodeOptions, Error, OptimizeLevel, Toggle, Value,
    ValueMap,
};

fn roundtrip(value: &Value, options: &EncodeOptions) {
    let text = encode_with_options(value, options);
    match decode(&text) {
        Ok(back) => assert_eq!(&back, value, "encoded as:\n{}", text),
        Err(e) => panic!("decode failed: {}\nencoded as:\n{}", e, text),
    }
}

fn all_delimiters() -> Vec<EncodeOptions> {
    Delimiter::CONCRETE
        .into_iter()
        .map(|d| EncodeOptions::new().with_delimiter(d))
        .chain(std::iter::once(EncodeOptions::default()))
        .collect()
}

fn rows(n: usize) -> Value {
    let statuses = ["active", "pending", "archived"];
    Value::Array(
        (0..n)
            .map(|i| {
                let mut row = ValueMap::new();
                row.insert("id".to_string(), Value::from(i));
                row.insert("status".to_string(), Value::from(statuses[i % 3]));
                Value::Object(row)
            })
            .collect(),
    )
}

#[test]
fn test_company_document_roundtrip() {
    let data = ctf!({
        "company": "Acme Corp",
        "founded": 1999,
        "public": false,
        "ceo": null,
        "address": {
            "street": "1 Main St",
            "city": "Springfield",
            "geo": {"lat": 39.78, "lng": (-89.65)}
        },
        "employees": [
            {"id": 1, "name": "Alice", "dept": "Engineering", "salary": 120000.5},
            {"id": 2, "name": "Bob", "dept": "Engineering", "salary": 98000},
            {"id": 3, "name": "Carol", "dept": "Engineering", "salary": 105000},
            {"id": 4, "name": "Dan", "dept": "Sales", "salary": 70000}
        ],
        "tags": ["b2b", "saas", "remote first"],
        "offices": [],
        "misc": [1, "two", {"three": 3}, [4, 5], null, {}]
    });

    for options in all_delimiters() {
        roundtrip(&data, &options);
    }
}

#[test]
fn test_primitive_mapping() {
    assert_eq!(encode(&ctf!({"x": null})), "x:_");
    assert_eq!(encode(&ctf!({"x": true})), "x:+");
    assert_eq!(encode(&ctf!({"x": false})), "x:-");
    assert_eq!(encode(&ctf!({"x": 42})), "x:42");
    assert_eq!(encode(&ctf!({"x": (-7.25)})), "x:-7.25");
    assert_eq!(encode(&ctf!({"x": 0.1})), "x:0.1");
}

#[test]
fn test_number_precision_survives() {
    let data = ctf!({
        "big": 9007199254740991_i64,
        "neg": (-9007199254740991_i64),
        "tiny": 0.000001234,
        "huge": 1.5e300,
        "third": (1.0 / 3.0)
    });
    roundtrip(&data, &EncodeOptions::default());
}

#[test]
fn test_quoting_recovers_strings_exactly() {
    let tricky = [
        "key:value",
        "a|b",
        "two  spaces",
        "tab\tinside",
        "line\nbreak",
        "quote \"here\"",
        "back\\slash",
        "^1",
        "",
        " padded ",
        "_",
        "+",
        "-",
        "123",
        "-4.5",
        "1e5",
        "NaN",
        "[1 2]",
        "{}",
        "a,b",
        "x=y",
        "user@example.com",
    ];

    for s in tricky {
        let data = ctf!({"v": s, "list": [s, s], "nested": {"inner": s}});
        let text = encode(&data);
        assert_eq!(decode(&text).unwrap(), data, "string {:?} encoded as:\n{}", s, text);
    }
}

#[test]
fn test_unquoted_strings_are_never_altered() {
    let data = ctf!({"a": "hello world", "b": "ünïcödé", "c": "Infinity"});
    assert_eq!(encode(&data), "a:hello world\nb:ünïcödé\nc:Infinity");
    assert_eq!(decode("a:hello world").unwrap(), ctf!({"a": "hello world"}));
}

#[test]
fn test_tabular_threshold() {
    let two = ctf!({"users": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]});
    assert_eq!(
        encode(&two),
        "users@2:\n  -:\n    id:1\n    name:A\n  -:\n    id:2\n    name:B"
    );

    let three = ctf!({"users": [
        {"id": 1, "name": "A"},
        {"id": 2, "name": "B"},
        {"id": 3, "name": "C"}
    ]});
    assert_eq!(encode(&three), "users@3|id,name:\n  1|A\n  2|B\n  3|C");
}

#[test]
fn test_columnar_threshold() {
    let large = ctf!({"rows": (rows(1000))});
    let text = encode(&large);
    let header = text.lines().find(|l| l.starts_with("rows@")).unwrap();
    assert!(header.starts_with("rows@1000||"), "header was {}", header);
    assert!(text.contains("|id:[0..999]"));
    assert_eq!(decode(&text).unwrap(), large);

    let smaller = ctf!({"rows": (rows(999))});
    let text = encode(&smaller);
    assert!(!text.contains("||"));
    assert!(text.contains("rows@999|id,status:"));
    assert_eq!(decode(&text).unwrap(), smaller);
}

#[test]
fn test_columnar_can_be_disabled() {
    let large = ctf!({"rows": (rows(1000))});
    let options = EncodeOptions::new().with_columnar(false);
    let text = encode_with_options(&large, &options);
    assert!(!text.contains("||"));
    assert_eq!(decode(&text).unwrap(), large);
}

#[test]
fn test_reference_compression() {
    let s = "Engineering Department!"; // 23 chars
    assert_eq!(s.len(), 23);
    let data = ctf!({"teams": [{"dept": s}, {"dept": s}, {"dept": s}]});
    let options = EncodeOptions::new().with_references(true);

    let text = encode_with_options(&data, &options);
    assert_eq!(
        text,
        "^1=Engineering Department!\n\nteams@3|dept:\n  ^1\n  ^1\n  ^1"
    );
    assert_eq!(decode(&text).unwrap(), data);
}

#[test]
fn test_reference_minimums() {
    let options = EncodeOptions::new().with_references(true);

    let twice = ctf!({"a": "a long repeated string", "b": "a long repeated string"});
    assert!(!encode_with_options(&twice, &options).contains('^'));

    let short = ctf!({"a": "abcd", "b": "abcd", "c": "abcd", "d": "abcd", "e": "abcd"});
    assert!(!encode_with_options(&short, &options).contains('^'));
}

#[test]
fn test_auto_references_follow_optimize_level() {
    // (3 − 1)·23 − 6 = 40: above zero, below the balanced threshold
    let s = "Engineering Department!";
    let data = ctf!({"a": s, "b": s, "c": s});

    let balanced = encode(&data);
    assert!(!balanced.starts_with('^'));

    let aggressive = encode_with_options(
        &data,
        &EncodeOptions::new().with_optimize(OptimizeLevel::Aggressive),
    );
    assert!(aggressive.starts_with("^1="));

    let none = encode_with_options(&data, &EncodeOptions::new().with_optimize(OptimizeLevel::None));
    assert!(!none.starts_with('^'));
}

#[test]
fn test_delimiter_selection() {
    let balanced = ctf!({"a": ["x|y", "x,y", "x\ty"]});
    assert_eq!(choose_delimiter(&analyze(&balanced)), Delimiter::Pipe);

    let piped = ctf!({"rows": [
        {"path": "a|b", "n": 1},
        {"path": "c|d", "n": 2},
        {"path": "e|f", "n": 3}
    ]});
    assert_eq!(choose_delimiter(&analyze(&piped)), Delimiter::Comma);
    let text = encode(&piped);
    assert!(text.starts_with("rows@3,path,n:"));
    assert_eq!(decode(&text).unwrap(), piped);
}

#[test]
fn test_optimize_none_uses_pipe() {
    let piped = ctf!({"rows": [{"p": "a|b"}, {"p": "c|d"}, {"p": "e|f"}]});
    let options = EncodeOptions::new().with_optimize(OptimizeLevel::None);
    let text = encode_with_options(&piped, &options);
    assert!(text.starts_with("rows@3|p:"));
    assert_eq!(decode(&text).unwrap(), piped);
}

#[test]
fn test_strict_failure_and_lenient_padding() {
    let input = "users@2|id,name,role:\n1|Alice\n2|Bob|user";

    let err = decode(input).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert_eq!(err.line(), Some(2));

    let lenient = DecodeOptions::new().with_strict(false);
    assert_eq!(
        decode_with_options(input, &lenient).unwrap(),
        ctf!({"users": [
            {"id": 1, "name": "Alice", "role": ""},
            {"id": 2, "name": "Bob", "role": "user"}
        ]})
    );
}

#[test]
fn test_decode_scenarios() {
    assert_eq!(
        decode("users@3|id,name,role:\n1|Alice|admin\n2|Bob|user\n3|Charlie|dev").unwrap(),
        ctf!({"users": [
            {"id": 1, "name": "Alice", "role": "admin"},
            {"id": 2, "name": "Bob", "role": "user"},
            {"id": 3, "name": "Charlie", "role": "dev"}
        ]})
    );

    assert_eq!(
        decode("^1=Engineering\n\nitems@3|dept:\n^1\n^1\n^1").unwrap(),
        ctf!({"items": [
            {"dept": "Engineering"},
            {"dept": "Engineering"},
            {"dept": "Engineering"}
        ]})
    );
}

#[test]
fn test_validation_error_for_missing_rows() {
    let err = decode("users@3|id:\n1\n2").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert!(err.to_string().contains("declares 3"));
}

#[test]
fn test_non_object_roots() {
    for value in [
        ctf!([1, 2, 3]),
        ctf!([{"a": 1}, {"a": 2}, {"a": 3}]),
        ctf!("just a string"),
        ctf!(12.5),
        ctf!(null),
        ctf!(true),
        ctf!([]),
    ] {
        roundtrip(&value, &EncodeOptions::default());
    }
}

#[test]
fn test_empty_containers() {
    let data = ctf!({"empty_obj": {}, "empty_arr": [], "nested": {"deeper": {}}});
    assert_eq!(encode(&data), "empty_obj:{}\nempty_arr@0:\nnested:\n  deeper:{}");
    roundtrip(&data, &EncodeOptions::default());
    roundtrip(&ctf!({}), &EncodeOptions::default());
}

#[test]
fn test_custom_indent() {
    let data = ctf!({"a": {"b": {"c": 1}}, "l": [[1], [2]]});
    let options = EncodeOptions::new().with_indent(4);
    let text = encode_with_options(&data, &options);
    assert_eq!(text, "a:\n    b:\n        c:1\nl@2:\n    -:[1]\n    -:[2]");
    assert_eq!(decode(&text).unwrap(), data);
}

#[test]
fn test_encoding_is_deterministic() {
    let data = ctf!({"rows": (rows(50)), "name": "repeatable"});
    let options = EncodeOptions::new().with_references(Toggle::On);
    assert_eq!(
        encode_with_options(&data, &options),
        encode_with_options(&data, &options)
    );
}

#[test]
fn test_stats_for_tabular_data() {
    let data = ctf!({"users": [
        {"id": 1, "name": "Alice", "role": "admin"},
        {"id": 2, "name": "Bob", "role": "user"},
        {"id": 3, "name": "Charlie", "role": "dev"}
    ]});
    let json = serde_json::to_string(&data).unwrap();
    let text = encode(&data);
    let stats = get_stats(&json, &text);

    assert_eq!(stats.original_bytes, json.len());
    assert_eq!(stats.encoded_bytes, text.len());
    assert!(stats.savings_bytes > 0);
    assert!(stats.ratio < 1.0);
    assert_eq!(stats.reference_count, 0);
}

#[test]
fn test_json_interop() {
    let json = r#"{"name":"Ann","scores":[1,2.5,-3],"meta":{"ok":true,"none":null}}"#;
    let value: Value = serde_json::from_str(json).unwrap();
    let back = decode(&encode(&value)).unwrap();
    assert_eq!(serde_json::to_string(&back).unwrap(), json);
}
