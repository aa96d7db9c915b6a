#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ridgematch::{
    ExtractConfig, Extractor, MatchConfig, Matcher, Minutia, MinutiaKind, MinutiaSet, RidgeImage,
};

fn make_capture(width: usize, height: usize, period: f32, tilt: f32) -> RidgeImage {
    let (sin, cos) = tilt.to_radians().sin_cos();
    let (cx, cy) = (width as f32 * 0.5, height as f32 * 0.5);
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (dx, dy) = (x as f32 - cx, y as f32 - cy);
            let u = dx * cos + dy * sin;
            let phase = 2.0 * std::f32::consts::PI * u / period + dy.atan2(dx);
            data.push((128.0 + 100.0 * phase.cos()).clamp(0.0, 255.0) as u8);
        }
    }
    RidgeImage::new(data, width, height, 500).unwrap()
}

fn random_set(rng: &mut StdRng, count: usize) -> MinutiaSet {
    (0..count)
        .map(|_| {
            Minutia::new(
                rng.random_range(0.0..300.0),
                rng.random_range(0.0..300.0),
                rng.random_range(0.0..360.0),
                MinutiaKind::RidgeEnding,
                rng.random_range(0.2..1.0),
            )
        })
        .collect()
}

#[test]
fn parallel_identify_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(11);
    let probe = random_set(&mut rng, 40);
    let mut sets: Vec<MinutiaSet> = (0..12).map(|_| random_set(&mut rng, 40)).collect();
    sets[3] = probe.transformed(15.0, 20.0, -10.0);
    sets[8] = probe.transformed(-40.0, 0.0, 35.0);

    let seq = Matcher::new(MatchConfig {
        parallel: false,
        ..MatchConfig::default()
    })
    .unwrap();
    let par = Matcher::new(MatchConfig {
        parallel: true,
        ..MatchConfig::default()
    })
    .unwrap();

    let gallery: Vec<_> = sets.iter().map(|s| seq.compile(s)).collect();
    let seq_ranked = seq.identify(&probe, &gallery);
    let par_ranked = par.identify(&probe, &gallery);
    assert_eq!(seq_ranked, par_ranked);
    assert_eq!(seq_ranked.len(), 12);
    let top: Vec<_> = seq_ranked.iter().take(2).map(|c| c.index).collect();
    assert!(top.contains(&3) && top.contains(&8));
}

#[test]
fn parallel_batch_extraction_matches_sequential() {
    let captures = vec![
        make_capture(128, 128, 9.0, 0.0),
        make_capture(144, 128, 10.0, 30.0),
        make_capture(128, 160, 11.0, 75.0),
        RidgeImage::new(vec![128; 64 * 64], 64, 64, 500).unwrap(),
    ];
    let seq = Extractor::new(ExtractConfig {
        parallel: false,
        ..ExtractConfig::default()
    })
    .unwrap();
    let par = Extractor::new(ExtractConfig {
        parallel: true,
        ..ExtractConfig::default()
    })
    .unwrap();

    let seq_out = seq.extract_batch(&captures);
    let par_out = par.extract_batch(&captures);
    assert_eq!(seq_out.len(), par_out.len());
    for (a, b) in seq_out.iter().zip(&par_out) {
        match (a, b) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a.minutiae(), b.minutiae());
                assert_eq!(a.skeleton(), b.skeleton());
            }
            (Err(a), Err(b)) => assert_eq!(a, b),
            _ => panic!("sequential and parallel outcomes differ"),
        }
    }
    assert!(seq_out[3].is_err());
}
