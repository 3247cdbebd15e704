//! Property tests for decoding, mass calibration and peak analysis.

use proptest::prelude::*;
use tofcal::prelude::*;
use tofcal::waveform::DecodeOutcome;

proptest! {
    /// floor(L / 4) samples for any byte length L, whatever the chunk size
    #[test]
    fn test_decode_length(
        bytes in prop::collection::vec(any::<u8>(), 0..512),
        chunk in 1usize..64,
    ) {
        let decoder = WaveformDecoder::default().with_chunk_bytes(chunk);
        let decoded = decoder.decode_reader(bytes.as_slice(), &CancelToken::new());

        prop_assert!(matches!(decoded.outcome, DecodeOutcome::Complete));
        prop_assert_eq!(decoded.samples.len(), bytes.len() / 4);
        for (i, v) in decoded.samples.iter().enumerate() {
            let b = &bytes[i * 4..i * 4 + 4];
            prop_assert_eq!(*v, u32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        }
    }

    /// The fitted law maps each reference index back onto its mass
    #[test]
    fn test_calibration_invertibility(
        t1 in 0.0f64..10_000.0,
        dt in 1.0f64..10_000.0,
        m1 in 0.5f64..500.0,
        dm in 0.5f64..500.0,
    ) {
        let points = CalibrationPoints::new(t1, m1, t1 + dt, m1 + dm);
        let transform = MassCalibrator::fit(&points).unwrap();

        prop_assert!((transform.mass(points.t1) - m1).abs() <= 1e-6 * m1.max(1.0));
        prop_assert!((transform.mass(points.t2) - points.m2).abs() <= 1e-6 * points.m2.max(1.0));
    }

    /// Degenerate points are always rejected
    #[test]
    fn test_calibration_rejection(
        t in -1000.0f64..1000.0,
        m in 0.1f64..100.0,
        bad_mass in -100.0f64..=0.0,
    ) {
        let same_index = CalibrationPoints::new(t, m, t, m + 1.0);
        let bad_first = CalibrationPoints::new(t, bad_mass, t + 1.0, m);
        let bad_second = CalibrationPoints::new(t, m, t + 1.0, bad_mass);

        for points in [same_index, bad_first, bad_second] {
            let is_invalid = matches!(
                MassCalibrator::fit(&points),
                Err(CalibrationError::InvalidCalibration(_))
            );
            prop_assert!(is_invalid);
        }
    }

    /// Repeated analysis of the same input yields the same peaks, each
    /// bounded by its zero-crossings with the maximum inside.
    #[test]
    fn test_peak_determinism(
        samples in prop::collection::vec(-20.0f64..100.0, 3..200),
        threshold in 0.0f64..80.0,
    ) {
        let n = samples.len();
        let spectrum = MassSpectrum::new(
            (0..n).map(|i| i as f64).collect(),
            Trace::new(samples.clone()),
        )
        .unwrap();
        let analyzer = PeakAnalyzer::new(threshold, 0.0, n as f64);

        let first = analyzer.analyze(&spectrum);
        let second = analyzer.analyze(&spectrum);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(&a, &b);
                for p in a.peaks.iter() {
                    prop_assert!(p.height >= threshold);
                    prop_assert!(p.left <= p.index && p.index <= p.right);
                    prop_assert!(p.left == 0 || samples[p.left] <= 0.0);
                    prop_assert!(p.right == n - 1 || samples[p.right] <= 0.0);
                }
            }
            (Err(PeakError::NoPeaksFound { .. }), Err(PeakError::NoPeaksFound { .. })) => {}
            (a, b) => prop_assert!(false, "inconsistent results: {:?} vs {:?}", a, b),
        }
    }
}
