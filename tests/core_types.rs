use ridgematch::{
    Grid, ImageView, Minutia, MinutiaKind, MinutiaSet, RidgeImage, RidgeMatchError,
};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        RidgeMatchError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );
    assert!(err.is_invalid_image());
}

#[test]
fn image_view_rejects_invalid_stride_and_short_buffer() {
    let data = [0u8; 8];
    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        RidgeMatchError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );

    let err = ImageView::new(&data[..3], 2, 2, 2).err().unwrap();
    assert_eq!(err, RidgeMatchError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn padded_view_copies_into_contiguous_image() {
    // 3x2 image stored with stride 4; the padding column holds 99.
    let data = [1u8, 2, 3, 99, 4, 5, 6, 99];
    let view = ImageView::new(&data, 3, 2, 4).unwrap();
    assert_eq!(view.get(2, 1), Some(6));
    assert_eq!(view.get(3, 1), None);
    assert_eq!(view.row(1), Some(&[4u8, 5, 6][..]));

    let owned = RidgeImage::from_view(view, 500).unwrap();
    assert_eq!(owned.data(), &[1, 2, 3, 4, 5, 6]);
    assert_eq!(owned.view().stride(), 3);
    assert_eq!(owned.ppi(), 500);
}

#[test]
fn ridge_image_requires_resolution_and_exact_buffer() {
    assert_eq!(
        RidgeImage::new(vec![0; 4], 2, 2, 0).unwrap_err(),
        RidgeMatchError::InvalidResolution { ppi: 0 }
    );
    assert!(RidgeImage::new(vec![0; 5], 2, 2, 500).is_err());
    assert!(RidgeImage::new(vec![0; 3], 2, 2, 500).is_err());
}

#[test]
fn grid_bounds_are_checked() {
    let grid = Grid::from_vec(vec![0.0f32, 1.0, 2.0, 3.0], 2, 2).unwrap();
    assert_eq!(grid.get(1, 1), Some(3.0));
    assert_eq!(grid.get(2, 0), None);
    assert_eq!(grid.get_signed(-1, 0), None);
    assert!((grid.sample_bilinear(0.5, 0.5) - 1.5).abs() < 1e-6);
    assert!(Grid::new(0, 3, false).is_err());
}

#[test]
fn minutia_angles_and_reliability_are_normalized() {
    let m = Minutia::new(1.0, 2.0, -90.0, MinutiaKind::RidgeEnding, 1.7);
    assert!((m.angle_deg - 270.0).abs() < 1e-4);
    assert_eq!(m.reliability, 1.0);

    let m = Minutia::new(0.0, 0.0, 725.0, MinutiaKind::Bifurcation, f32::NAN);
    assert!((m.angle_deg - 5.0).abs() < 1e-4);
    assert_eq!(m.reliability, 0.0);
}

#[test]
fn rigid_transform_preserves_distances_and_kinds() {
    let set: MinutiaSet = [
        Minutia::new(10.0, 20.0, 30.0, MinutiaKind::RidgeEnding, 0.5),
        Minutia::new(70.0, -5.0, 350.0, MinutiaKind::Bifurcation, 0.9),
    ]
    .into_iter()
    .collect();
    let moved = set.transformed(90.0, 5.0, 5.0);

    let a = moved.as_slice();
    assert!((a[0].x - -15.0).abs() < 1e-3);
    assert!((a[0].y - 15.0).abs() < 1e-3);
    assert!((a[0].angle_deg - 120.0).abs() < 1e-3);
    assert!((a[1].angle_deg - 80.0).abs() < 1e-3);
    let before = set.as_slice()[0].distance(&set.as_slice()[1]);
    assert!((a[0].distance(&a[1]) - before).abs() < 1e-3);
    assert_eq!(moved.count_kind(MinutiaKind::Bifurcation), 1);
}
