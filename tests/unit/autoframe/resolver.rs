use std::io::Cursor;

use super::*;
use crate::assets::provider::MemoryAssetProvider;

fn png_with_rect(w: u32, h: u32, rect: Option<(u32, u32, u32, u32)>) -> Vec<u8> {
    let mut img = image::RgbaImage::new(w, h);
    if let Some((x0, y0, x1, y1)) = rect {
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
            }
        }
    }
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn prepared(w: u32, h: u32, rect: Option<(u32, u32, u32, u32)>) -> PreparedImage {
    decode_image(&png_with_rect(w, h, rect)).unwrap()
}

fn id(s: &str) -> LayerId {
    LayerId::new(s).unwrap()
}

fn resolver_with(entries: Vec<(Category, &str, Vec<u8>)>) -> AlphaFocusResolver {
    let mut p = MemoryAssetProvider::new();
    for (c, i, bytes) in entries {
        p.insert(c, id(i), bytes);
    }
    AlphaFocusResolver::new(Arc::new(p), AutoframeOpts::default())
}

#[test]
fn bounds_follow_the_sampling_grid() {
    let img = prepared(30, 30, Some((4, 7, 20, 13)));
    let b = alpha_bounds(&img, 3, 8).unwrap();
    assert_eq!(
        b,
        AlphaBounds {
            min_x: 6,
            min_y: 9,
            max_x: 18,
            max_y: 12
        }
    );
}

#[test]
fn alpha_at_threshold_is_not_content() {
    let mut img = image::RgbaImage::new(9, 9);
    img.put_pixel(3, 3, image::Rgba([0, 0, 0, 8]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    let img = decode_image(&buf).unwrap();
    assert!(alpha_bounds(&img, 3, 8).is_none());
    assert!(alpha_bounds(&img, 3, 7).is_some());
}

#[test]
fn measure_focus_centers_and_fills_tighter_axis() {
    // Content spans x 30..=60, y 45..=54 on a 90x90 canvas (both on the stride-3 grid).
    let img = prepared(90, 90, Some((30, 45, 60, 54)));
    let f = measure_focus(&img, &AutoframeOpts::default()).unwrap();
    assert!((f.center_x - 0.5).abs() < 1e-9);
    assert!((f.center_y - (99.0 / 2.0) / 90.0).abs() < 1e-9);
    // Width is the tighter axis: 0.78 / (30 / 90) = 2.34.
    assert!((f.scale - 2.34).abs() < 1e-9);
}

#[test]
fn measure_focus_clamps_scale() {
    let tiny = prepared(300, 300, Some((150, 150, 152, 152)));
    assert_eq!(measure_focus(&tiny, &AutoframeOpts::default()).unwrap().scale, 3.2);

    let full = prepared(30, 30, Some((0, 0, 29, 29)));
    assert_eq!(measure_focus(&full, &AutoframeOpts::default()).unwrap().scale, 1.05);
}

#[test]
fn single_sample_content_floors_extent_at_one_pixel() {
    let dot = prepared(9, 9, Some((3, 3, 3, 3)));
    let f = measure_focus(&dot, &AutoframeOpts::default()).unwrap();
    assert!(f.scale.is_finite());
    assert_eq!(f.scale, 3.2);
    assert!((f.center_x - 3.0 / 9.0).abs() < 1e-9);
}

#[test]
fn transparent_resource_resolves_to_exact_fallback() {
    let r = resolver_with(vec![(Category::Eyes, "eyes-01", png_with_rect(12, 12, None))]);
    let f = r.resolve(Category::Eyes, &id("eyes-01"));
    assert_eq!(f, AlphaFocus::centered(1.5));
    assert_eq!(r.cache().len(), 1);
}

#[test]
fn repeated_resolve_hits_cache_and_is_bit_identical() {
    let r = resolver_with(vec![(
        Category::Accessory,
        "acc-01",
        png_with_rect(60, 60, Some((9, 12, 30, 42))),
    )]);
    let a = r.resolve(Category::Accessory, &id("acc-01"));
    let b = r.resolve(Category::Accessory, &id("acc-01"));
    assert_eq!(a.scale.to_bits(), b.scale.to_bits());
    assert_eq!(a.center_x.to_bits(), b.center_x.to_bits());
    assert_eq!(a.center_y.to_bits(), b.center_y.to_bits());
    assert_eq!(r.scan_count(), 1);
}

#[test]
fn decode_failure_degrades_and_is_not_cached() {
    let r = resolver_with(vec![(Category::Eyes, "eyes-02", b"not an image".to_vec())]);
    assert!(r.try_resolve(Category::Eyes, &id("eyes-02")).is_err());
    assert_eq!(r.resolve(Category::Eyes, &id("eyes-02")), AlphaFocus::centered(1.5));
    assert!(r.cache().is_empty());

    // Missing resources take the same path.
    assert_eq!(r.resolve(Category::Base, &id("base-01")), AlphaFocus::centered(1.5));
}

#[test]
fn nose_thumbnails_use_boost_and_nose_fallback() {
    let r = resolver_with(vec![
        (Category::Nose, "nose-01", png_with_rect(90, 90, Some((30, 45, 60, 54)))),
        (Category::Nose, "nose-02", b"garbage".to_vec()),
        (Category::Nose, "nose-03", png_with_rect(12, 12, None)),
    ]);
    let boosted = r.thumbnail_focus(Category::Nose, &id("nose-01"));
    assert!((boosted.scale - 2.34 * 1.85).abs() < 1e-9);

    assert_eq!(
        r.thumbnail_focus(Category::Nose, &id("nose-02")),
        AlphaFocus::centered(2.9)
    );
    let transparent = r.thumbnail_focus(Category::Nose, &id("nose-03"));
    assert!((transparent.scale - 1.5 * 1.85).abs() < 1e-9);
}

#[test]
fn resolve_many_preserves_order_and_fills_cache_once_per_resource() {
    let r = resolver_with(vec![
        (Category::Accessory, "acc-01", png_with_rect(30, 30, Some((0, 0, 29, 29)))),
        (Category::Accessory, "acc-02", png_with_rect(12, 12, None)),
    ]);
    let layers = vec![
        (Category::Accessory, id("acc-01")),
        (Category::Accessory, id("acc-02")),
        (Category::Accessory, id("acc-01")),
    ];
    let out = r.resolve_many(&layers);
    assert_eq!(out.len(), 3);
    assert_eq!(out[0], out[2]);
    assert_eq!(out[1], AlphaFocus::centered(1.5));
    assert_eq!(r.cache().len(), 2);
}

#[test]
fn shared_cache_serves_a_second_resolver() {
    let provider: Arc<dyn AssetProvider> = Arc::new(MemoryAssetProvider::new().with(
        Category::Eyes,
        id("eyes-03"),
        png_with_rect(30, 30, Some((3, 3, 12, 12))),
    ));
    let cache = Arc::new(FocusCache::new());
    let first = AlphaFocusResolver::with_cache(provider.clone(), cache.clone(), AutoframeOpts::default());
    let second = AlphaFocusResolver::with_cache(provider, cache, AutoframeOpts::default());
    let a = first.resolve(Category::Eyes, &id("eyes-03"));
    let b = second.resolve(Category::Eyes, &id("eyes-03"));
    assert_eq!(a, b);
    assert_eq!(second.scan_count(), 0);
}
