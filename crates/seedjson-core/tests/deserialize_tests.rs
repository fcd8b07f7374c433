use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use seedjson_core::{
    deserialize, deserialize_with, from_reader, Arguments, DeclaredType, Deserializer, FromScalar,
    Options, Param, Reconstruct, Record, Result, Scalar, SeedError, SeedStack, TypeMetadata,
};

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, PartialEq, Record)]
struct Only {
    s: String,
}

#[derive(Debug, PartialEq, Record)]
struct Pair {
    s: String,
    f: f64,
}

#[derive(Debug, Clone, PartialEq, Record)]
struct Inner {
    x: f64,
}

#[derive(Debug, PartialEq, Record)]
struct Outer {
    s: Inner,
}

#[derive(Debug, PartialEq, Record)]
struct Series {
    s: Vec<f64>,
}

#[derive(Debug, PartialEq, Record)]
struct Shapes {
    points: Vec<Inner>,
}

#[derive(Debug, PartialEq, Record)]
struct Counts {
    counts: HashMap<String, f64>,
}

#[derive(Debug, PartialEq, Record)]
struct Grid {
    rows: Vec<Vec<i32>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Active,
    Retired,
}

impl FromScalar for Status {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::String(s) if s == "active" => Ok(Status::Active),
            Scalar::String(s) if s == "retired" => Ok(Status::Retired),
            other => Err(SeedError::InvalidValue {
                expected: "employee status".to_string(),
                found: other.to_string(),
            }),
        }
    }
}

impl Reconstruct for Status {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar::<Self>()
    }
}

#[derive(Debug, PartialEq, Record)]
struct Employee {
    name: String,
    age: u32,
    status: Status,
    hired: NaiveDate,
    manager: Option<Box<Employee>>,
    reports: Vec<Employee>,
    tags: BTreeMap<String, String>,
    last_login: Option<DateTime<Utc>>,
}

/// A record with a list parameter whose element type is unknown.
struct Loose;

impl Record for Loose {
    fn parameters() -> Vec<Param> {
        vec![Param::with_type("items", DeclaredType::erased_sequence("List"))]
    }

    fn construct(_args: &mut Arguments) -> Result<Self> {
        Ok(Loose)
    }
}

impl Reconstruct for Loose {
    fn declared_type() -> DeclaredType {
        DeclaredType::record::<Self>()
    }
}

/// Helper: deserialize `input` as `T`, expecting failure.
fn failure<T: Reconstruct + std::fmt::Debug>(input: &str) -> SeedError {
    deserialize::<T>(input).expect_err("expected deserialization to fail")
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn single_string_member() {
    let only: Only = deserialize(r#"{"s":"x"}"#).unwrap();
    assert_eq!(only, Only { s: "x".to_string() });
}

#[test]
fn string_and_number_members() {
    let pair: Pair = deserialize(r#"{"s":"x","f":1}"#).unwrap();
    assert_eq!(
        pair,
        Pair {
            s: "x".to_string(),
            f: 1.0,
        }
    );
}

#[test]
fn member_order_does_not_matter() {
    let a: Pair = deserialize(r#"{"s":"x","f":1}"#).unwrap();
    let b: Pair = deserialize(r#"{"f":1,"s":"x"}"#).unwrap();
    assert_eq!(a, b);
}

#[test]
fn nested_record_member() {
    let outer: Outer = deserialize(r#"{"s": {"x": 1}}"#).unwrap();
    assert_eq!(outer.s, Inner { x: 1.0 });
}

#[test]
fn duplicate_member_last_write_wins() {
    let inner: Inner = deserialize(r#"{"x": 1, "x": 2}"#).unwrap();
    assert_eq!(inner.x, 2.0);
}

#[test]
fn missing_required_member() {
    match failure::<Pair>(r#"{"s": "x"}"#) {
        SeedError::MissingArgument {
            type_name,
            parameter,
        } => {
            assert!(type_name.ends_with("Pair"), "{type_name}");
            assert_eq!(parameter, "f");
        }
        other => panic!("expected MissingArgument, got {other:?}"),
    }
}

#[test]
fn unknown_member() {
    let err = failure::<Pair>(r#"{"s": "x", "f": 1, "g": 2}"#);
    assert!(matches!(err, SeedError::UnknownProperty { ref name, .. } if name == "g"));
}

#[test]
fn unknown_composite_member() {
    let err = failure::<Pair>(r#"{"s": "x", "f": 1, "g": {"h": 2}}"#);
    assert!(matches!(err, SeedError::UnknownProperty { ref name, .. } if name == "g"));
}

#[test]
fn wrong_scalar_kind_is_an_invalid_value() {
    assert!(matches!(
        failure::<Pair>(r#"{"s": 1, "f": 1}"#),
        SeedError::InvalidValue { .. }
    ));
    assert!(matches!(
        failure::<Pair>(r#"{"s": "x", "f": "1"}"#),
        SeedError::InvalidValue { .. }
    ));
}

#[test]
fn empty_record() {
    #[derive(Debug, PartialEq, Record)]
    struct Marker {}

    assert_eq!(deserialize::<Marker>("{}").unwrap(), Marker {});
    assert!(matches!(
        failure::<Marker>(r#"{"a": 1}"#),
        SeedError::UnknownProperty { .. }
    ));
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn sequence_of_numbers() {
    let series: Series = deserialize(r#"{"s": [1, 2]}"#).unwrap();
    assert_eq!(series.s, vec![1.0, 2.0]);
}

#[test]
fn empty_sequence() {
    let series: Series = deserialize(r#"{"s": []}"#).unwrap();
    assert!(series.s.is_empty());
}

#[test]
fn sequence_of_records() {
    let shapes: Shapes = deserialize(r#"{"points": [{"x": 1}, {"x": 2.5}]}"#).unwrap();
    assert_eq!(shapes.points, vec![Inner { x: 1.0 }, Inner { x: 2.5 }]);
}

#[test]
fn scalar_in_sequence_of_records() {
    assert!(matches!(
        failure::<Shapes>(r#"{"points": [1]}"#),
        SeedError::TypeMismatch { .. }
    ));
}

#[test]
fn composite_in_sequence_of_scalars() {
    assert!(matches!(
        failure::<Series>(r#"{"s": [[1]]}"#),
        SeedError::TypeMismatch { .. }
    ));
    assert!(matches!(
        failure::<Series>(r#"{"s": [{"x": 1}]}"#),
        SeedError::TypeMismatch { .. }
    ));
}

#[test]
fn scalar_where_sequence_declared() {
    assert!(matches!(
        failure::<Series>(r#"{"s": 1}"#),
        SeedError::TypeMismatch { .. }
    ));
}

#[test]
fn composite_where_scalar_declared() {
    assert!(matches!(
        failure::<Pair>(r#"{"s": ["x"], "f": 1}"#),
        SeedError::TypeMismatch { .. }
    ));
}

#[test]
fn nested_sequences() {
    let grid: Grid = deserialize(r#"{"rows": [[1, 2], [], [3]]}"#).unwrap();
    assert_eq!(grid.rows, vec![vec![1, 2], vec![], vec![3]]);
}

#[test]
fn other_sequence_containers() {
    let queue: VecDeque<String> = deserialize(r#"["a", "b"]"#).unwrap();
    assert_eq!(queue, VecDeque::from(vec!["a".to_string(), "b".to_string()]));
}

#[test]
fn declared_type_decides_between_object_and_array_syntax() {
    // Member names of an object are ignored when a sequence is declared.
    let series: Series = deserialize(r#"{"s": {"a": 1, "b": 2}}"#).unwrap();
    assert_eq!(series.s, vec![1.0, 2.0]);

    // Array elements have no name, so they match no record parameter.
    let err = failure::<Outer>(r#"{"s": [1]}"#);
    assert!(matches!(err, SeedError::UnknownProperty { ref name, .. } if name.is_empty()));
}

// ============================================================================
// Maps
// ============================================================================

#[test]
fn map_of_numbers() {
    let counts: Counts = deserialize(r#"{"counts": {"a": 1, "b": 2}}"#).unwrap();
    assert_eq!(counts.counts.len(), 2);
    assert_eq!(counts.counts["b"], 2.0);
}

#[test]
fn map_duplicate_key_last_write_wins() {
    let counts: Counts = deserialize(r#"{"counts": {"a": 1, "a": 2}}"#).unwrap();
    assert_eq!(counts.counts.len(), 1);
    assert_eq!(counts.counts["a"], 2.0);
}

#[test]
fn map_of_records_composite_wins() {
    let map: HashMap<String, Inner> = deserialize(r#"{"k": 1, "k": {"x": 3}}"#).unwrap();
    assert_eq!(map["k"], Inner { x: 3.0 });
}

#[test]
fn map_of_sequences() {
    let map: BTreeMap<String, Vec<f64>> = deserialize(r#"{"a": [1], "b": [2, 3]}"#).unwrap();
    assert_eq!(map["a"], vec![1.0]);
    assert_eq!(map["b"], vec![2.0, 3.0]);
}

#[test]
fn map_scalar_conversion_error() {
    assert!(matches!(
        failure::<Counts>(r#"{"counts": {"a": "one"}}"#),
        SeedError::InvalidValue { .. }
    ));
}

#[test]
fn map_composite_for_scalar_value() {
    assert!(matches!(
        failure::<Counts>(r#"{"counts": {"a": [1]}}"#),
        SeedError::TypeMismatch { .. }
    ));
}

// ============================================================================
// Optional, boxed and user-defined scalar types
// ============================================================================

#[test]
fn optional_members() {
    #[derive(Debug, PartialEq, Record)]
    struct Opt {
        name: Option<String>,
        inner: Option<Inner>,
        values: Option<Vec<f64>>,
    }

    let empty: Opt = deserialize("{}").unwrap();
    assert_eq!(
        empty,
        Opt {
            name: None,
            inner: None,
            values: None,
        }
    );

    let nulls: Opt = deserialize(r#"{"name": null, "inner": null, "values": null}"#).unwrap();
    assert_eq!(nulls, empty);

    let full: Opt = deserialize(r#"{"name": "n", "inner": {"x": 1}, "values": [2]}"#).unwrap();
    assert_eq!(
        full,
        Opt {
            name: Some("n".to_string()),
            inner: Some(Inner { x: 1.0 }),
            values: Some(vec![2.0]),
        }
    );
}

#[test]
fn optional_record_rejects_non_null_scalar() {
    #[derive(Debug, Record)]
    struct Holder {
        inner: Option<Inner>,
    }

    assert!(matches!(
        failure::<Holder>(r#"{"inner": 5}"#),
        SeedError::TypeMismatch { .. }
    ));
    let holder: Holder = deserialize(r#"{"inner": null}"#).unwrap();
    assert!(holder.inner.is_none());
}

#[test]
fn integers_must_be_integral_and_in_range() {
    #[derive(Debug, Record)]
    struct Ints {
        small: u8,
        signed: i64,
    }

    let ints: Ints = deserialize(r#"{"small": 255, "signed": -3e2}"#).unwrap();
    assert_eq!((ints.small, ints.signed), (255, -300));

    assert!(matches!(
        failure::<Ints>(r#"{"small": 256, "signed": 0}"#),
        SeedError::InvalidValue { .. }
    ));
    assert!(matches!(
        failure::<Ints>(r#"{"small": 1.5, "signed": 0}"#),
        SeedError::InvalidValue { .. }
    ));
    assert!(matches!(
        failure::<Ints>(r#"{"small": -1, "signed": 0}"#),
        SeedError::InvalidValue { .. }
    ));
}

#[test]
fn sixty_four_bit_integers_reject_values_past_their_bounds() {
    assert_eq!(deserialize::<i64>("-9223372036854775808").unwrap(), i64::MIN);
    assert_eq!(
        deserialize::<i64>("9223372036854774784").unwrap(),
        9_223_372_036_854_774_784
    );
    assert!(matches!(
        failure::<i64>("9223372036854775808"),
        SeedError::InvalidValue { .. }
    ));
    assert!(matches!(
        failure::<u64>("18446744073709551616"),
        SeedError::InvalidValue { .. }
    ));
    assert!(matches!(
        failure::<u32>("4294967296"),
        SeedError::InvalidValue { .. }
    ));
    assert_eq!(deserialize::<u32>("4294967295").unwrap(), u32::MAX);
}

#[test]
fn numbers_beyond_f64_range() {
    assert_eq!(deserialize::<f64>("1e400").unwrap(), f64::INFINITY);
    assert_eq!(deserialize::<Vec<f64>>("[-1e400]").unwrap(), vec![f64::NEG_INFINITY]);
    assert!(matches!(failure::<i64>("1e400"), SeedError::InvalidValue { .. }));
}

#[test]
fn user_defined_scalar() {
    let statuses: Vec<Status> = deserialize(r#"["active", "retired"]"#).unwrap();
    assert_eq!(statuses, vec![Status::Active, Status::Retired]);
    assert!(matches!(
        failure::<Vec<Status>>(r#"["fired"]"#),
        SeedError::InvalidValue { .. }
    ));
}

#[test]
fn dates_and_timestamps() {
    #[derive(Debug, Record)]
    struct Stamps {
        day: NaiveDate,
        local: NaiveDateTime,
        at: DateTime<Utc>,
    }

    let stamps: Stamps = deserialize(
        r#"{"day": "2024-02-29", "local": "2024-02-29T12:00:00", "at": "2024-02-29T12:00:00-05:00"}"#,
    )
    .unwrap();
    assert_eq!(stamps.day, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    assert_eq!(stamps.local, stamps.day.and_hms_opt(12, 0, 0).unwrap());
    assert_eq!(stamps.at, Utc.with_ymd_and_hms(2024, 2, 29, 17, 0, 0).unwrap());

    assert!(matches!(
        failure::<Stamps>(r#"{"day": "2023-02-29", "local": "2024-02-29T12:00:00", "at": "2024-02-29T12:00:00Z"}"#),
        SeedError::InvalidValue { .. }
    ));
}

#[test]
fn realistic_document() {
    let input = r#"
    {
        "name": "Ada",
        "age": 36,
        "status": "active",
        "hired": "2020-03-01",
        "manager": {
            "name": "Grace",
            "age": 50,
            "status": "retired",
            "hired": "1990-01-15",
            "reports": [],
            "tags": {}
        },
        "reports": [
            {
                "name": "Linus",
                "age": 28,
                "status": "active",
                "hired": "2022-07-11",
                "manager": null,
                "reports": [],
                "tags": {"team": "kernel"}
            }
        ],
        "tags": {"team": "compilers", "site": "remote"},
        "last_login": "2024-05-01T09:30:00+02:00"
    }"#;

    let ada: Employee = deserialize(input).unwrap();
    assert_eq!(ada.name, "Ada");
    assert_eq!(ada.age, 36);
    assert_eq!(ada.status, Status::Active);
    assert_eq!(ada.hired, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
    assert_eq!(
        ada.last_login,
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap())
    );

    let grace = ada.manager.as_deref().expect("manager");
    assert_eq!(grace.name, "Grace");
    assert_eq!(grace.status, Status::Retired);
    assert!(grace.manager.is_none());
    assert!(grace.last_login.is_none());

    assert_eq!(ada.reports.len(), 1);
    assert_eq!(ada.reports[0].name, "Linus");
    assert_eq!(ada.reports[0].tags["team"], "kernel");
    assert_eq!(ada.tags.keys().collect::<Vec<_>>(), vec!["site", "team"]);
}

// ============================================================================
// Root values
// ============================================================================

#[test]
fn root_collections() {
    let inners: Vec<Inner> = deserialize(r#"[{"x": 1}, {"x": 2}]"#).unwrap();
    assert_eq!(inners.len(), 2);

    let map: HashMap<String, Vec<f64>> = deserialize(r#"{"a": [1, 2]}"#).unwrap();
    assert_eq!(map["a"], vec![1.0, 2.0]);
}

#[test]
fn root_scalars() {
    assert_eq!(deserialize::<f64>("3.5").unwrap(), 3.5);
    assert_eq!(deserialize::<String>(r#""hi""#).unwrap(), "hi");
    assert_eq!(deserialize::<Option<Inner>>("null").unwrap(), None);
    assert_eq!(deserialize::<Option<i32>>(" 7 ").unwrap(), Some(7));
}

#[test]
fn root_kind_mismatches() {
    assert!(matches!(failure::<Inner>("1"), SeedError::TypeMismatch { .. }));
    assert!(matches!(failure::<f64>("[1]"), SeedError::TypeMismatch { .. }));
    assert!(matches!(failure::<String>("{}"), SeedError::TypeMismatch { .. }));
}

#[test]
fn boxed_root() {
    let boxed: Box<Inner> = deserialize(r#"{"x": 4}"#).unwrap();
    assert_eq!(*boxed, Inner { x: 4.0 });
}

#[test]
fn erased_container_is_unsupported() {
    assert!(matches!(
        deserialize::<Loose>(r#"{"items": [1]}"#).err(),
        Some(SeedError::UnsupportedType { ref type_name }) if type_name == "List"
    ));

    // Rejected before any input is read.
    let metadata = TypeMetadata::new();
    assert!(matches!(
        SeedStack::new(&metadata, DeclaredType::erased_mapping("Dict")).err(),
        Some(SeedError::UnsupportedType { .. })
    ));
}

// ============================================================================
// Malformed input and limits
// ============================================================================

#[test]
fn missing_comma_is_malformed() {
    assert!(matches!(
        failure::<Pair>(r#"{"s": "x" "f": 1}"#),
        SeedError::MalformedInput { .. }
    ));
}

#[test]
fn trailing_content_is_malformed() {
    assert!(matches!(
        failure::<Only>(r#"{"s": "x"} x"#),
        SeedError::MalformedInput { .. }
    ));
    assert!(matches!(
        failure::<Only>(r#"{"s": "x"} {"s": "y"}"#),
        SeedError::MalformedInput { .. }
    ));
}

#[test]
fn syntax_error_wins_over_later_type_errors() {
    // No value is produced even though a valid record was already complete.
    assert!(matches!(
        failure::<Vec<Inner>>(r#"[{"x": 1}, {"x": 2},]"#),
        SeedError::MalformedInput { .. }
    ));
}

#[test]
fn depth_limit() {
    let options = Options::default().with_max_depth(2);
    let err = deserialize_with::<Vec<Vec<Vec<f64>>>>("[[[1]]]", &options).unwrap_err();
    assert!(matches!(err, SeedError::DepthLimitExceeded { limit: 2, .. }));

    let ok: Vec<Vec<f64>> = deserialize_with("[[1]]", &options).unwrap();
    assert_eq!(ok, vec![vec![1.0]]);
}

#[test]
fn options_load_from_config() {
    let options: Options = serde_json::from_str(r#"{"max_depth": 4}"#).unwrap();
    assert_eq!(options, Options::default().with_max_depth(4));

    let defaults: Options = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults.max_depth, 128);

    let written = serde_json::to_string(&options).unwrap();
    assert_eq!(written, r#"{"max_depth":4}"#);
}

// ============================================================================
// Entry points
// ============================================================================

#[test]
fn from_reader_reads_everything() {
    let pair: Pair = from_reader(&br#"{"s": "x", "f": 2}"#[..]).unwrap();
    assert_eq!(pair.f, 2.0);
}

#[test]
fn from_reader_reports_invalid_utf8() {
    let err = from_reader::<Pair, _>(&[0xff, 0xfe, 0xfd][..]).unwrap_err();
    assert!(matches!(err, SeedError::Io(_)));
}

#[test]
fn deserialize_from_char_stream() {
    let deserializer = Deserializer::new();
    let chunks = [r#"{"s": "#, r#""x", "f""#, ": 3}"];
    let pair: Pair = deserializer
        .deserialize_chars(chunks.iter().flat_map(|chunk| chunk.chars()))
        .unwrap();
    assert_eq!(pair.f, 3.0);
}

#[test]
fn deserializer_reuses_metadata() {
    let deserializer = Deserializer::with_options(Options::default());
    for n in 0..3 {
        let outer: Outer = deserializer
            .deserialize(&format!(r#"{{"s": {{"x": {n}}}}}"#))
            .unwrap();
        assert_eq!(outer.s.x, n as f64);
    }
    assert_eq!(deserializer.metadata().cached_records(), 2);
    assert_eq!(deserializer.options().max_depth, 128);
}

#[test]
fn seed_stack_spawns_repeatedly() {
    let metadata = TypeMetadata::new();
    let mut stack = SeedStack::new(&metadata, Shapes::declared_type()).unwrap();
    seedjson_core::parse(r#"{"points": [{"x": 1}, {"x": 2}]}"#, &mut stack).unwrap();
    assert_eq!(stack.depth(), 0);

    let first = *stack.spawn().unwrap().downcast::<Shapes>().unwrap();
    let second = *stack.spawn().unwrap().downcast::<Shapes>().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.points[1].x, 2.0);
}

#[test]
fn seed_stack_refuses_to_spawn_unfinished_root() {
    let metadata = TypeMetadata::new();
    let stack = SeedStack::new(&metadata, Inner::declared_type()).unwrap();
    assert!(matches!(stack.spawn().err(), Some(SeedError::Protocol { .. })));
}
