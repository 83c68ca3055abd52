use tex_alloc_core::prelude::*;

fn atlas() -> AtlasAllocator {
    // areas: (0,0,64,64) (64,0,64,64) (0,64,128,64)
    AtlasAllocator::new(Size::splat(64), Size::splat(128), 0)
}

#[test]
fn request_exceeding_row_remainder_opens_row_in_next_area() {
    let mut a = atlas();
    let areas: Vec<Rect> = a.areas().collect();

    let p1 = a.try_allocate(40, 64).unwrap();
    assert!(areas[0].contains(&p1.rect));

    // 24 px left in the first row, and the first area has no height left
    let p2 = a.try_allocate(25, 64).unwrap();
    assert_eq!(p2.rect, Rect::new(64, 0, 25, 64));
    assert!(areas[1].contains(&p2.rect));
    assert_eq!(a.row_info(p2.row()).unwrap().area.index(), 1);

    // the newest row is tried first even though the older row also fits
    let p3 = a.try_allocate(24, 64).unwrap();
    assert_eq!(p3.row(), p2.row());
    assert_eq!(p3.rect.x, 89);
}

#[test]
fn wide_request_skips_narrow_areas() {
    let mut a = atlas();
    let areas: Vec<Rect> = a.areas().collect();
    let p = a.try_allocate(100, 30).unwrap();
    assert!(areas[2].contains(&p.rect));
    assert_eq!(p.rect, Rect::new(0, 64, 100, 30));
}

#[test]
fn wide_request_skips_narrow_head_row_for_older_wide_row() {
    let mut a = atlas();
    let w1 = a.try_allocate(70, 10).unwrap();
    let w2 = a.try_allocate(58, 10).unwrap();
    assert_eq!(w1.rect, Rect::new(0, 64, 70, 10));
    assert_eq!(w2.row(), w1.row());

    // wide row is full, so the next row opens in the first (narrow) area
    let n = a.try_allocate(40, 10).unwrap();
    assert_eq!(n.rect, Rect::new(0, 0, 40, 10));
    assert_eq!(a.row_info(n.row()).unwrap().area.index(), 0);
    assert!(a.free(w1));
    assert_eq!(a.bucket_len(4), 2);

    let r = a.try_allocate(70, 10).unwrap();
    assert_eq!(r.row(), w1.row());
    assert_eq!(r.rect, Rect::new(0, 64, 70, 10));
    assert_eq!(a.bucket_len(4), 2);
    let stats = a.stats();
    assert_eq!(stats.num_rows, 2);
    assert_eq!(stats.pool_misses, 2);
}

#[test]
fn exhaustion_returns_none_without_side_effects() {
    let mut a = atlas();
    a.try_allocate(64, 64).unwrap();
    a.try_allocate(64, 64).unwrap();
    a.try_allocate(100, 64).unwrap();
    let before = a.stats();
    assert!(a.try_allocate(29, 64).is_none());
    assert!(a.try_allocate(1, 1).is_none());
    let after = a.stats();
    assert_eq!(before, after);
    // the 28 px tail of the last row is still usable
    let tail = a.try_allocate(28, 64).unwrap();
    assert_eq!(tail.rect, Rect::new(100, 64, 28, 64));
}

#[test]
fn freed_area_space_is_reused_before_later_areas() {
    let mut a = atlas();
    let p1 = a.try_allocate(64, 32).unwrap();
    let p2 = a.try_allocate(64, 32).unwrap();
    assert_eq!(p2.rect.y, 32);
    assert!(a.free(p1));
    // first area has a 32 px strip again; a 16 px row lands there
    let p3 = a.try_allocate(8, 16).unwrap();
    assert_eq!(p3.rect, Rect::new(0, 0, 8, 16));
}
