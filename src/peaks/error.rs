/// Errors that can occur during peak analysis
#[derive(Debug, thiserror::Error)]
pub enum PeakError {
    /// No samples fall inside the requested mass window
    #[error("No data in m/q window {start}–{end}")]
    EmptyWindow {
        /// Window start (m/q)
        start: f64,
        /// Window end (m/q)
        end: f64,
    },

    /// Detection found no local maximum at or above the threshold
    #[error("No peaks detected at threshold {threshold}; lower the threshold or widen the window")]
    NoPeaksFound {
        /// Detection threshold that was used
        threshold: f64,
    },
}
