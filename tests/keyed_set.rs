// KeyedSet integration tests.
//
// Each test states the behavior it verifies. Invariants exercised:
// - Membership follows the strategy's notion of equality: identity for
//   references, coerced number or text for scalars, canonical bytes for
//   digests.
// - A value with no key fails its call and leaves the set unchanged.
// - Bulk lookup agrees element-wise with `contains`.
// - Under `Trust`, colliding fingerprints merge; under `Verify` they do not.
use std::collections::HashMap;
use std::rc::Rc;
use surrogate_hash::digest::fast32;
use surrogate_hash::{
    CanonicalSerializer, DigestConfig, Error, ExternalHandle, KeyedSet, Numeric,
    Postcard, Value,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Test: build from a batch, remove one, look up all.
// Verifies: lookup reports the removed value absent and the rest present.
#[test]
fn numeric_set_remove_then_lookup() {
    init_logs();
    let mut s = KeyedSet::<i32, _>::from_values(Numeric, [1, 2, 3]).expect("all numeric");
    assert!(s.remove(&2).unwrap());
    assert_eq!(s.lookup([1, 2, 3]).unwrap(), vec![true, false, true]);
}

// Test: host values with different types but the same number.
// Verifies: integer, double and logical coerce to one key.
#[test]
fn numeric_set_coerces_host_values() {
    let mut s = KeyedSet::<Value, _>::numeric();
    s.insert(&Value::Integer(1)).unwrap();
    assert!(s.contains(&Value::Double(1.0)).unwrap());
    assert!(s.contains(&Value::Logical(true)).unwrap());
    assert!(!s.insert(&Value::Double(1.0)).unwrap());
    assert_eq!(s.len(), 1);

    s.insert(&Value::Double(f64::NAN)).unwrap();
    assert!(s.contains(&Value::Double(f64::NAN)).unwrap());
    s.insert(&Value::Double(-0.0)).unwrap();
    assert!(s.contains(&Value::Integer(0)).unwrap());
}

// Test: integers past the f64 mantissa.
// Verifies: an integer with no exact number form is rejected rather than
// merged with its rounded neighbour; exact ones still coerce.
#[test]
fn numeric_set_rejects_inexact_wide_integers() {
    let mut s = KeyedSet::<u64, _>::with_strategy(Numeric);
    let edge = 1u64 << 53;
    assert!(s.insert(&edge).unwrap());
    let err = s.contains(&(edge + 1)).unwrap_err();
    assert_eq!(
        err,
        Error::TypeConversion {
            index: None,
            expected: "number",
            found: "u64"
        }
    );
    assert!(s.insert(&(edge + 1)).is_err());
    assert_eq!(s.len(), 1);

    let err = s.update([edge + 2, edge + 3]).unwrap_err();
    assert_eq!(err.index(), Some(1));
    assert_eq!(s.len(), 1);
    assert!(s.contains(&edge).unwrap());
}

// Test: equal content in two separate allocations.
// Verifies: the digest set treats them as one member, the reference set
// as two.
#[test]
fn digest_conflates_equal_content_reference_does_not() {
    init_logs();
    let a = Rc::new(Value::record([("x", Value::Integer(1)), ("y", Value::from("z"))]));
    let b = Rc::new(Value::record([("x", Value::Integer(1)), ("y", Value::from("z"))]));
    assert!(!Rc::ptr_eq(&a, &b));

    let mut by_content = KeyedSet::<Value, _>::digest(DigestConfig::default());
    by_content.insert(&a).unwrap();
    assert!(by_content.contains(&a).unwrap());
    assert!(by_content.contains(&b).unwrap());
    assert!(!by_content.insert(&b).unwrap());
    assert_eq!(by_content.len(), 1);

    let mut by_identity = KeyedSet::<Rc<Value>, _>::by_reference();
    by_identity.insert(&a).unwrap();
    assert!(by_identity.contains(&a).unwrap());
    assert!(!by_identity.contains(&b).unwrap());
    by_identity.insert(&b).unwrap();
    assert_eq!(by_identity.len(), 2);
}

// Test: names are part of a list's content.
// Verifies: same elements under different names are different members.
#[test]
fn digest_distinguishes_element_names() {
    let mut s = KeyedSet::<Value, _>::digest(DigestConfig::default());
    s.insert(&Value::record([("a", Value::Integer(1))])).unwrap();
    assert!(!s.contains(&Value::record([("b", Value::Integer(1))])).unwrap());
    assert!(!s.contains(&Value::list([Value::Integer(1)])).unwrap());
}

// Test: bulk update with an unserializable element.
// Verifies: the error carries the element's index and nothing is inserted.
#[test]
fn unserializable_element_aborts_update() {
    init_logs();
    let mut s = KeyedSet::<Value, _>::digest(DigestConfig::default());
    let batch = [
        Value::Integer(1),
        Value::External(ExternalHandle::new("connection")),
        Value::Integer(2),
    ];
    let err = s.update(&batch).unwrap_err();
    assert!(matches!(err, Error::Serialization { index: Some(1), .. }));
    assert!(err.to_string().starts_with("element at index 1: serialization failed"));
    assert!(s.is_empty());
}

// Test: textual strategy on host values.
// Verifies: text is keyed by content; non-text values are rejected with
// the type names in the message.
#[test]
fn textual_set_rejects_non_text() {
    let mut s = KeyedSet::<Value, _>::textual();
    s.insert(&Value::from("a")).unwrap();
    assert!(s.contains(&Value::Text(String::from("a"))).unwrap());
    let err = s.insert(&Value::Integer(1)).unwrap_err();
    assert_eq!(err.to_string(), "cannot convert integer to text");
    assert_eq!(s.len(), 1);
}

// Test: bulk lookup against per-element contains.
// Verifies: lookup(vs)[i] == contains(vs[i]) for a mixed batch.
#[test]
fn bulk_lookup_matches_scalar_contains() {
    let s = KeyedSet::<str, _>::from_values(surrogate_hash::Textual, ["a", "c", "e"]).unwrap();
    let probe = ["a", "b", "c", "d", "", "e"];
    let bulk = s.lookup(probe).unwrap();
    let single: Vec<bool> = probe.iter().map(|p| s.contains(p).unwrap()).collect();
    assert_eq!(bulk, single);
    assert_eq!(bulk, vec![true, false, true, false, false, true]);
}

// Test: a handful of distinct values under both digests.
// Verifies: far below the birthday bound no two values merge, every
// inserted value is found, and no value left out is reported present.
#[test]
fn few_values_never_collide() {
    for config in [DigestConfig::default(), DigestConfig::fast()] {
        let mut s = KeyedSet::<u64, _>::digest(config);
        s.update(0..200u64).unwrap();
        assert_eq!(s.len(), 200);
        assert!(s.lookup(0..200u64).unwrap().into_iter().all(|hit| hit));
        for absent in 200..400u64 {
            assert!(!s.contains(&absent).unwrap(), "{absent} reported present");
        }
    }
}

// Finds two u64 values whose canonical bytes share a Fast32 fingerprint.
fn fast32_collision() -> (u64, u64) {
    let mut seen: HashMap<u32, u64> = HashMap::new();
    for n in 0..(1u64 << 22) {
        let bytes = Postcard.to_canonical_bytes(&n).unwrap();
        if let Some(&m) = seen.get(&fast32(&bytes)) {
            return (m, n);
        }
        seen.insert(fast32(&bytes), n);
    }
    panic!("no 32-bit collision among 2^22 values");
}

// Test: a real Fast32 collision.
// Assumes: a pair exists well within 2^22 values (birthday bound 2^16).
// Verifies: Trust merges the pair; Verify keeps them apart.
#[test]
fn fast32_collision_policy() {
    init_logs();
    let (a, b) = fast32_collision();
    assert_ne!(a, b);

    let mut trusted = KeyedSet::<u64, _>::digest(DigestConfig::fast());
    assert!(trusted.insert(&a).unwrap());
    assert!(trusted.contains(&b).unwrap());
    assert!(!trusted.insert(&b).unwrap());
    assert_eq!(trusted.len(), 1);

    let mut verified = KeyedSet::<u64, _>::digest(DigestConfig::fast().verify_collisions());
    assert!(verified.insert(&a).unwrap());
    assert!(!verified.contains(&b).unwrap());
    assert!(verified.insert(&b).unwrap());
    assert_eq!(verified.len(), 2);
    assert_eq!(verified.strategy().config().birthday_bound(), None);
    assert_eq!(trusted.strategy().config().birthday_bound(), Some(1 << 16));
}

// Test: dump of a digest set.
// Verifies: header names the strategy and each line is a hex fingerprint.
#[test]
fn digest_dump_prints_fingerprints() {
    let s = KeyedSet::<str, _>::from_values(
        surrogate_hash::ContentDigest::new(DigestConfig::default()),
        ["abc"],
    )
    .unwrap();
    let mut out = String::new();
    s.dump(&mut out).unwrap();
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("*Hash Set* (sha256 digest)"));
    assert_eq!(lines.next(), Some(""));
    let fp = lines.next().unwrap();
    assert_eq!(fp.len(), 64);
    assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(lines.next(), None);
}
