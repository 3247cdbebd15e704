#![no_main]

use libfuzzer_sys::fuzz_target;
use tofcal::prelude::*;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode without panicking, and whatever comes out
    // must survive calibration and peak analysis.
    let decoded = WaveformDecoder::default().decode_reader(data, &CancelToken::new());
    assert_eq!(decoded.samples.len(), data.len() / 4);

    let trace = Trace::new(decoded.samples.iter().map(|&v| v as f64).collect());
    let n = trace.len();
    if n < 3 {
        return;
    }

    let points = CalibrationPoints::new(0.0, 1.0, (n - 1) as f64, 4.0);
    let Ok(transform) = MassCalibrator::fit(&points) else {
        return;
    };
    let spectrum = MassCalibrator::apply(&transform, &trace);
    let analyzer = PeakAnalyzer::full_range(f64::from(data[0]) * 1e6, &spectrum);
    if let Ok(analysis) = analyzer.analyze(&spectrum) {
        for peak in analysis.peaks.iter() {
            assert!(peak.left <= peak.index && peak.index <= peak.right);
        }
    }
});
