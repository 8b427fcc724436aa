// NamedMap integration tests.
//
// Invariants exercised:
// - Round trip: insert(n, v) then get(n) == Some(&v); last write wins.
// - A miss is None, never a stored null.
// - Batch operations check every name before writing; a rejected batch
//   leaves the map as it was and constructs nothing.
// - lookup/retrieve answer in input order.
use surrogate_hash::{Error, NameConflict, NamedMap, Value};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Test: build from named host values of mixed type.
// Verifies: present names are found, absent names miss.
#[test]
fn build_from_entries_then_query() {
    init_logs();
    let m = NamedMap::from_entries([
        (Some("a"), Value::Integer(1)),
        (Some("b"), Value::from("x")),
    ])
    .expect("all named");
    assert!(m.contains("a"));
    assert_eq!(m.get("a"), Some(&Value::Integer(1)));
    assert_eq!(m.get("b"), Some(&Value::from("x")));
    assert_eq!(m.get("c"), None);
}

// Test: parallel names and values of different lengths.
// Verifies: NameConflict names the first unmatched index; nothing is built.
#[test]
fn mismatched_parts_fail_construction() {
    init_logs();
    let err = NamedMap::from_parts(["a", "b"], [Value::Integer(1)]).unwrap_err();
    assert_eq!(
        err,
        Error::NameConflict {
            index: 1,
            conflict: NameConflict::LengthMismatch {
                names: 2,
                values: 1
            }
        }
    );
    assert_eq!(
        err.to_string(),
        "element at index 1 has no corresponding value (2 names for 1 values)"
    );

    let err = NamedMap::from_parts(["a"], [1, 2, 3]).unwrap_err();
    assert_eq!(err.index(), Some(1));
    assert!(err.to_string().contains("has no corresponding name"));
}

// Test: a failed update on an existing map.
// Verifies: neither the valid prefix nor the suffix is written.
#[test]
fn rejected_update_leaves_map_unchanged() {
    let mut m = NamedMap::from_parts(["keep"], [Value::Null]).unwrap();
    let err = m
        .update_from_parts(["x", "y", "z"], [Value::Integer(1), Value::Integer(2)])
        .unwrap_err();
    assert_eq!(err.index(), Some(2));
    assert_eq!(m.len(), 1);
    assert_eq!(m.lookup(["keep", "x", "y"]), vec![true, false, false]);
}

// Test: absence sentinel versus stored null.
// Verifies: an empty map misses everything; a stored Null is found.
#[test]
fn miss_is_distinct_from_stored_null() {
    let mut m: NamedMap<Value> = NamedMap::new();
    assert!(m.is_empty());
    assert_eq!(m.get("anything"), None);
    assert_eq!(m.get(""), None);

    assert_eq!(m.insert("n", Value::Null), None);
    assert_eq!(m.get("n"), Some(&Value::Null));
    assert!(m.contains("n"));
}

// Test: duplicate names within one batch.
// Verifies: last write wins and the entry is stored once.
#[test]
fn duplicate_names_in_batch_last_write_wins() {
    let mut m = NamedMap::new();
    m.update_from_parts(["a", "b", "a", "a"], [1, 2, 3, 4]).unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("a"), Some(&4));
    assert_eq!(m.names().count(), 2);
}

// Test: retrieve preserves input order and reports misses.
// Verifies: result i answers name i, including repeats.
#[test]
fn retrieve_answers_in_input_order() {
    let m = NamedMap::from_parts(["x", "y"], [10, 20]).unwrap();
    assert_eq!(
        m.retrieve(["y", "missing", "x", "y"]),
        vec![Some(&20), None, Some(&10), Some(&20)]
    );
    assert_eq!(m.lookup(Vec::<String>::new()), Vec::<bool>::new());
}

// Test: values are stored intact, including nested lists.
// Verifies: get returns an equal value and get_mut edits in place.
#[test]
fn values_round_trip_intact() {
    let nested = Value::record([
        ("inner", Value::list([Value::Integer(1), Value::Double(2.5)])),
        ("flag", Value::Logical(false)),
    ]);
    let mut m = NamedMap::new();
    m.insert("cfg", nested.clone());
    assert_eq!(m.get("cfg"), Some(&nested));

    if let Some(Value::List(items)) = m.get_mut("cfg") {
        items.push((Some(String::from("added")), Value::Null));
    }
    assert_ne!(m.get("cfg"), Some(&nested));
    assert_eq!(
        m.remove("cfg").map(|v| v.to_string()).as_deref(),
        Some("list(inner = list(1L, 2.5), flag = FALSE, added = NULL)")
    );
}

// Test: dump through the host's renderer and Debug.
// Verifies: empty maps print <empty>; entries print name then value.
#[test]
fn dump_and_debug() {
    let mut m: NamedMap<Value> = NamedMap::with_capacity(4);
    let mut out = String::new();
    m.dump(&mut out).unwrap();
    assert_eq!(out, "*Hash Map*\n\n<empty>\n");

    m.insert("t", Value::Logical(true));
    out.clear();
    m.dump(&mut out).unwrap();
    assert_eq!(out, "*Hash Map*\n\n[[\"t\"]]\nTRUE\n\n");
    assert_eq!(format!("{m:?}"), "{\"t\": Logical(true)}");
}
