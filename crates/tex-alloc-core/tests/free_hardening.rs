use tex_alloc_core::prelude::*;

fn atlas() -> AtlasAllocator {
    AtlasAllocator::new(Size::splat(64), Size::splat(256), 0)
}

#[test]
fn empty_placement_is_a_noop() {
    let mut a = atlas();
    let p = a.try_allocate(10, 10).unwrap();
    assert!(Placement::empty().is_empty());
    assert!(Placement::default().is_empty());
    assert!(!a.free(Placement::empty()));
    assert_eq!(a.stats().num_placements, 1);
    assert!(a.free(p));
}

#[test]
fn double_free_is_rejected() {
    let mut a = atlas();
    let p = a.try_allocate(10, 10).unwrap();
    let keep = a.try_allocate(10, 10).unwrap();
    assert!(a.free(p));
    assert!(!a.free(p));
    let stats = a.stats();
    assert_eq!(stats.num_placements, 1);
    assert_eq!(stats.num_rows, 1);
    assert!(a.row_info(keep.row()).is_some());
}

#[test]
fn double_free_after_slot_is_reissued_is_rejected() {
    let mut a = atlas();
    let p = a.try_allocate(10, 10).unwrap();
    let keep = a.try_allocate(10, 10).unwrap();
    assert_eq!(p.rect, Rect::new(0, 0, 10, 10));
    assert!(a.free(p));

    // same row, same interval, new owner
    let c = a.try_allocate(10, 10).unwrap();
    assert_eq!(c.rect, p.rect);
    assert_eq!(c.row(), p.row());
    assert!(!a.free(p));
    assert_eq!(a.stats().num_placements, 2);

    let d = a.try_allocate(10, 10).unwrap();
    for live in [c, keep] {
        assert!(!d.rect.intersects(&live.rect), "{:?} overlaps {:?}", d.rect, live.rect);
    }
    assert!(a.free(c));
    assert!(a.free(d));
    assert!(a.free(keep));
    assert!(a.is_empty());
}

#[test]
fn forged_placement_with_out_of_range_interval_is_rejected() {
    let mut a = atlas();
    let p = a.try_allocate(10, 10).unwrap();
    let mut json = serde_json::to_value(p).unwrap();
    json["row_alloc"]["start"] = serde_json::json!(u32::MAX);
    let forged: Placement = serde_json::from_value(json).unwrap();
    assert_eq!(forged.row(), p.row());

    let before = a.stats();
    assert!(!a.free(forged));
    assert_eq!(a.stats(), before);
    assert!(a.free(p));
}

#[test]
fn stale_placement_does_not_touch_recycled_row() {
    let mut a = atlas();
    let p = a.try_allocate(10, 10).unwrap();
    assert!(a.free(p));
    let q = a.try_allocate(10, 10).unwrap();
    assert_eq!(q.rect, p.rect);
    assert!(!a.free(p));
    assert_eq!(a.stats().num_placements, 1);
    assert!(a.row_info(q.row()).is_some());
    assert!(a.free(q));
    assert!(a.is_empty());
}

#[test]
fn clear_invalidates_outstanding_placements() {
    let mut a = atlas();
    let ps: Vec<Placement> = (1..20).map(|i| a.try_allocate(i, i).unwrap()).collect();
    let rows_before = a.stats().num_rows;
    assert!(rows_before > 0);

    a.clear();
    assert!(a.is_empty());
    let stats = a.stats();
    assert_eq!(stats.num_rows, 0);
    assert_eq!(stats.allocated_area, 0);
    assert_eq!(stats.pooled_rows, rows_before);
    for b in 0..a.bucket_count() as u32 {
        assert_eq!(a.bucket_len(b), 0);
    }
    for p in ps {
        assert!(!a.free(p));
    }
    let max = a.max_alloc_size();
    assert!(a.try_allocate(max.width, max.height).is_some());
}

#[test]
fn placements_survive_serialization() {
    let mut a = atlas();
    let p = a.try_allocate(12, 5).unwrap();
    let json = serde_json::to_string(&p).unwrap();
    let back: Placement = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
    assert!(a.free(back));
    assert!(a.is_empty());
}
