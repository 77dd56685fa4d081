use crate::core::frame::Frame;

/// Linear downsample scale applied to the live surface before comparison.
pub(crate) const SAMPLE_SCALE: f32 = 0.1;

/// Trigger threshold for a sensitivity in [1, 100]. Higher sensitivity
/// lowers the threshold: just under 30 at 1, floor of 2 at 100.
pub fn threshold_for(sensitivity: u32) -> f32 {
    30.0 - (sensitivity.clamp(1, 100) as f32 / 100.0) * 28.0
}

/// Normalized per-channel absolute difference of two same-sized RGBA
/// buffers: sum of |dR| + |dG| + |dB|, divided by `len * 0.75`. Alpha is
/// skipped in the sum but stays in the divisor; the 0.75 factor accounts
/// for sampling 3 of 4 channels and is preserved exactly.
pub fn average_diff(prev: &[u8], curr: &[u8]) -> f32 {
    let mut total: u64 = 0;
    for (a, b) in prev.chunks_exact(4).zip(curr.chunks_exact(4)) {
        total += (a[0] as i32 - b[0] as i32).unsigned_abs() as u64;
        total += (a[1] as i32 - b[1] as i32).unsigned_abs() as u64;
        total += (a[2] as i32 - b[2] as i32).unsigned_abs() as u64;
    }
    total as f32 / (prev.len() as f32 * 0.75)
}

/// True when `curr` differs enough from `prev` at the given sensitivity.
/// Size-mismatched buffers never trigger.
pub fn has_changed(prev: &Frame, curr: &Frame, sensitivity: u32) -> bool {
    prev.data.len() == curr.data.len()
        && average_diff(&prev.data, &curr.data) > threshold_for(sensitivity)
}

/// Stateful wrapper holding the comparison baseline for an automation run.
pub struct SceneChangeDetector {
    sensitivity: u32,
    baseline: Option<Frame>,
}

impl SceneChangeDetector {
    pub fn new(sensitivity: u32) -> Self {
        Self {
            sensitivity: sensitivity.clamp(1, 100),
            baseline: None,
        }
    }

    pub fn set_sensitivity(&mut self, sensitivity: u32) {
        self.sensitivity = sensitivity.clamp(1, 100);
    }

    pub fn threshold(&self) -> f32 {
        threshold_for(self.sensitivity)
    }

    /// Compares against the baseline, then replaces it with `frame`.
    /// The first frame only seeds the baseline and never triggers; a
    /// resolution change reseeds the same way.
    pub fn observe(&mut self, frame: &Frame) -> bool {
        let triggered = match &self.baseline {
            Some(prev) => has_changed(prev, frame, self.sensitivity),
            None => false,
        };
        self.baseline = Some(frame.clone());
        triggered
    }

    /// Compares against the baseline but replaces it only on a trigger.
    /// The fast-scan sweep uses this so every step is measured against the
    /// last captured scene rather than the previous step.
    pub fn observe_sticky(&mut self, frame: &Frame) -> bool {
        match &self.baseline {
            Some(prev) if prev.data.len() == frame.data.len() => {
                if has_changed(prev, frame, self.sensitivity) {
                    self.baseline = Some(frame.clone());
                    true
                } else {
                    false
                }
            }
            _ => {
                self.baseline = Some(frame.clone());
                false
            }
        }
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn reset(&mut self) {
        self.baseline = None;
    }
}
