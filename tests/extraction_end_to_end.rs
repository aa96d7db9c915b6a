use ridgematch::{
    extract_minutiae, ExtractConfig, Extractor, ImageView, Minutia, MinutiaKind, RidgeImage,
    RidgeMatchError,
};

/// Parallel ridges of period 10 px with two edge dislocations, each of which
/// inserts or removes a ridge and so forms an ending/bifurcation pair.
fn make_fingerprint(width: usize, height: usize) -> Vec<u8> {
    let defects = [
        (width as f32 * 0.35, height as f32 * 0.4, 1.0f32),
        (width as f32 * 0.65, height as f32 * 0.6, -1.0f32),
    ];
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (xf, yf) = (x as f32, y as f32);
            let mut phase = 2.0 * std::f32::consts::PI * xf / 10.0;
            for &(cx, cy, sign) in &defects {
                phase += sign * (yf - cy).atan2(xf - cx);
            }
            let value = 128.0 + 100.0 * phase.cos();
            data.push(value.clamp(0.0, 255.0) as u8);
        }
    }
    data
}

#[test]
fn blank_capture_is_quality_too_low() {
    for fill in [0u8, 128, 255] {
        let data = vec![fill; 128 * 128];
        let view = ImageView::from_slice(&data, 128, 128).unwrap();
        let err = Extractor::default().extract(view, 500).unwrap_err();
        assert_eq!(
            err,
            RidgeMatchError::QualityTooLow {
                foreground_blocks: 0
            }
        );
        assert!(!err.is_invalid_image());
    }
}

#[test]
fn capture_smaller_than_a_block_is_rejected() {
    let data = vec![0u8; 8 * 8];
    let view = ImageView::from_slice(&data, 8, 8).unwrap();
    let err = Extractor::default().extract(view, 500).unwrap_err();
    assert!(matches!(err, RidgeMatchError::ImageTooSmall { .. }));
}

#[test]
fn minutiae_lie_in_foreground_with_bounded_reliability() {
    let (width, height) = (192, 192);
    let data = make_fingerprint(width, height);
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let extraction = Extractor::default().extract(view, 500).unwrap();

    assert!(extraction.mask().foreground_blocks() > 0);
    assert!(extraction.skeleton().ridge_pixels() > 0);
    assert_eq!(extraction.scale(), 1.0);
    assert_eq!(extraction.ppi(), 500);
    for m in extraction.minutiae() {
        assert!(
            extraction.mask().is_foreground(m.x as usize, m.y as usize),
            "minutia at ({}, {}) is outside the foreground",
            m.x,
            m.y
        );
        assert!((0.0..=1.0).contains(&m.reliability));
        assert!((0.0..360.0).contains(&m.angle_deg));
    }
}

fn near(m: &Minutia, x: f32, y: f32, tolerance: f32) -> bool {
    (m.x - x).hypot(m.y - y) <= tolerance
}

#[test]
fn dislocations_yield_one_ending_and_one_bifurcation() {
    let (width, height) = (192, 192);
    let data = make_fingerprint(width, height);
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let extraction = Extractor::default().extract(view, 500).unwrap();
    let minutiae = extraction.minutiae();

    // Defect centres are (67.2, 76.8) and (124.8, 115.2).
    assert_eq!(minutiae.len(), 2, "found {:?}", minutiae.as_slice());
    assert_eq!(minutiae.count_kind(MinutiaKind::Bifurcation), 1);
    assert_eq!(minutiae.count_kind(MinutiaKind::RidgeEnding), 1);
    let fork = minutiae
        .iter()
        .find(|m| m.kind == MinutiaKind::Bifurcation)
        .unwrap();
    assert!(near(fork, 68.0, 78.0, 6.0), "bifurcation at ({}, {})", fork.x, fork.y);
    let end = minutiae
        .iter()
        .find(|m| m.kind == MinutiaKind::RidgeEnding)
        .unwrap();
    assert!(near(end, 125.0, 116.0, 6.0), "ending at ({}, {})", end.x, end.y);
}

#[test]
fn extraction_is_deterministic() {
    let (width, height) = (160, 160);
    let data = make_fingerprint(width, height);
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let extractor = Extractor::default();
    let first = extractor.extract(view, 500).unwrap();
    let second = extractor.extract(view, 500).unwrap();
    assert_eq!(first.minutiae(), second.minutiae());
    assert_eq!(first.binarized(), second.binarized());
}

#[test]
fn convenience_entry_returns_binarized_image() {
    let (width, height) = (128, 128);
    let data = make_fingerprint(width, height);
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let (minutiae, binarized) = extract_minutiae(view, 500).unwrap();
    assert_eq!((binarized.width(), binarized.height()), (width, height));
    assert!(binarized.ridge_pixels() > 0);
    assert_eq!(binarized.to_luma().len(), width * height);
    for m in &minutiae {
        assert!((m.x as usize) < width && (m.y as usize) < height);
    }
}

#[test]
fn low_resolution_capture_is_resampled_to_reference() {
    let data = make_fingerprint(96, 96);
    let image = RidgeImage::new(data, 96, 96, 250).unwrap();
    let extraction = Extractor::default().extract_image(&image).unwrap();
    assert_eq!(extraction.ppi(), 500);
    assert!((extraction.scale() - 2.0).abs() < 1e-6);
    assert_eq!(extraction.directions().image_size(), (192, 192));
    assert_eq!(extraction.binarized().width(), 192);
}

#[test]
fn coarser_blocks_keep_results_in_foreground() {
    let cfg = ExtractConfig {
        block_size: 24,
        boundary_margin: 16,
        ..ExtractConfig::default()
    };
    let (width, height) = (192, 192);
    let data = make_fingerprint(width, height);
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let extraction = Extractor::new(cfg).unwrap().extract(view, 500).unwrap();
    assert_eq!(extraction.directions().block_size(), 24);
    for m in extraction.minutiae() {
        assert!(extraction
            .mask()
            .square_is_foreground(m.x as usize, m.y as usize, 16));
    }
}
