use tex_alloc_core::prelude::*;

fn atlas(min: u32, max: u32, bias: u32) -> AtlasAllocator {
    AtlasAllocator::new(Size::splat(min), Size::splat(max), bias)
}

#[test]
fn rejects_zero_and_oversized_requests() {
    let mut a = atlas(64, 256, 0);
    let max = a.max_alloc_size();
    assert!(a.try_allocate(0, 10).is_none());
    assert!(a.try_allocate(10, 0).is_none());
    assert!(a.try_allocate(max.width + 1, 10).is_none());
    assert!(a.try_allocate(10, max.height + 1).is_none());
    assert!(a.is_empty());
    assert_eq!(a.stats().num_rows, 0);
}

#[test]
fn largest_request_succeeds_in_largest_area() {
    let mut a = atlas(64, 256, 0);
    let p = a.try_allocate(256, 128).expect("max alloc size fits");
    assert_eq!(p.rect, Rect::new(0, 128, 256, 128));
}

#[test]
fn placement_height_is_exact_and_row_height_is_quantized() {
    let bias = 3;
    let mut a = atlas(64, 256, bias);
    let max_h = a.max_alloc_size().height;
    for h in 1..=max_h {
        let p = a
            .try_allocate(5, h)
            .unwrap_or_else(|| panic!("height {h} should fit"));
        assert_eq!(p.rect.h, h);
        assert_eq!(p.rect.w, 5);
        let row = a.row_info(p.row()).expect("live row");
        let bucket = bucket_index(h, bias);
        assert_eq!(row.bucket, bucket);
        assert_eq!(row.rect.h, row_height(bucket, bias));
        assert!(row.rect.h >= h);
        assert!(row.rect.contains(&p.rect));
    }
}

#[test]
fn heights_at_or_below_bias_share_bucket_zero() {
    let mut a = atlas(64, 64, 4);
    let p1 = a.try_allocate(8, 1).unwrap();
    let p2 = a.try_allocate(8, 4).unwrap();
    let p3 = a.try_allocate(8, 5).unwrap();
    assert_eq!(p1.row(), p2.row());
    assert_eq!(p2.row(), p3.row());
    assert_eq!(a.row_info(p1.row()).unwrap().rect.h, 5);
    assert_eq!(a.bucket_len(0), 1);
}

#[test]
fn placements_lie_inside_the_surface() {
    let mut a = atlas(16, 128, 1);
    let surface = Rect::new(0, 0, 128, 128);
    let mut n = 0;
    while let Some(p) = a.try_allocate(7, 9) {
        assert!(surface.contains(&p.rect), "{:?}", p.rect);
        n += 1;
    }
    assert!(n > 0);
    assert_eq!(a.stats().num_placements, n);
}
