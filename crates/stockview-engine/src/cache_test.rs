use chrono::TimeZone;
use stockview_core::StockRecord;

use super::*;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap()
}

fn entry(name: &str, availability: &str, fetched_at: DateTime<Utc>) -> ManufacturerAvailability {
    ManufacturerAvailability::new(
        name,
        200,
        [StockRecord {
            item_id: "A1".to_string(),
            availability: availability.to_string(),
        }],
        fetched_at,
    )
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn empty_cache_reports_every_name() {
    let cache = ManufacturerCache::new();
    let wanted = names(&["abiplos", "reps", "Acme"]);
    assert_eq!(
        cache.stale_or_missing(&wanted, TimeDelta::minutes(5), at(0)),
        wanted
    );
}

#[test]
fn entry_is_fresh_at_four_minutes_and_stale_at_six() {
    let cache = ManufacturerCache::new().merge([entry("Acme", "INSTOCK", at(0))]);
    let wanted = names(&["Acme"]);
    let window = TimeDelta::minutes(5);

    assert!(cache.stale_or_missing(&wanted, window, at(4)).is_empty());
    assert_eq!(cache.stale_or_missing(&wanted, window, at(6)), wanted);
}

#[test]
fn only_unknown_and_stale_names_are_reported() {
    let cache = ManufacturerCache::new().merge([
        entry("fresh", "INSTOCK", at(10)),
        entry("stale", "INSTOCK", at(0)),
    ]);
    let wanted = names(&["fresh", "stale", "unknown"]);
    assert_eq!(
        cache.stale_or_missing(&wanted, TimeDelta::minutes(5), at(12)),
        names(&["stale", "unknown"])
    );
}

#[test]
fn names_outside_the_request_are_ignored() {
    let cache = ManufacturerCache::new().merge([entry("stale", "INSTOCK", at(0))]);
    let wanted = names(&["other"]);
    assert_eq!(
        cache.stale_or_missing(&wanted, TimeDelta::minutes(5), at(30)),
        wanted
    );
}

#[test]
fn merge_preserves_unrelated_entries() {
    let base = ManufacturerCache::new().merge([
        entry("reps", "INSTOCK", at(0)),
        entry("abiplos", "OUTOFSTOCK", at(0)),
    ]);
    let merged = base.merge([entry("Acme", "LESSTHAN10", at(3))]);

    assert_eq!(merged.len(), 3);
    assert_eq!(merged.get("reps"), base.get("reps"));
    assert_eq!(merged.get("abiplos"), base.get("abiplos"));
    assert_eq!(merged.names(), BTreeSet::from(["Acme", "abiplos", "reps"]));
}

#[test]
fn merge_replaces_same_named_entry() {
    let base = ManufacturerCache::new().merge([entry("reps", "INSTOCK", at(0))]);
    let merged = base.merge([entry("reps", "OUTOFSTOCK", at(7))]);

    assert_eq!(merged.len(), 1);
    let reps = merged.get("reps").unwrap();
    assert_eq!(reps.fetched_at, at(7));
    assert_eq!(reps.record_for("a1").unwrap().availability, "OUTOFSTOCK");
}

#[test]
fn merge_leaves_the_original_snapshot_untouched() {
    let base = ManufacturerCache::new().merge([entry("reps", "INSTOCK", at(0))]);
    let _merged = base.merge([entry("reps", "OUTOFSTOCK", at(7))]);
    assert_eq!(base.get("reps").unwrap().fetched_at, at(0));
}

#[test]
fn merge_is_idempotent() {
    let base = ManufacturerCache::new().merge([
        entry("reps", "INSTOCK", at(0)),
        entry("abiplos", "INSTOCK", at(0)),
    ]);
    let fresh = vec![
        entry("reps", "OUTOFSTOCK", at(8)),
        entry("Acme", "INSTOCK", at(8)),
    ];
    let once = base.merge(fresh.clone());
    let twice = once.merge(fresh);
    assert_eq!(once, twice);
}

#[test]
fn stale_entries_survive_merges() {
    let base = ManufacturerCache::new().merge([entry("old", "INSTOCK", at(0))]);
    let merged = base.merge([entry("new", "INSTOCK", at(59))]);
    assert_eq!(merged.get("old").unwrap().fetched_at, at(0));
}
