
use log::info;

/// Receives completion fractions in [0, 1] from long-running work.
/// Purely observational, nothing reported here changes a result.
pub trait ProgressSink {
    fn update(&mut self, fraction: f64);
}

/// Discards all updates
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _fraction: f64) {}
}

/// Logs at `info` each time progress crosses a new 10% step.
#[derive(Clone, Debug, Default)]
pub struct LogProgress {
    /// Prefix for each log line
    label: String,
    /// The last reported step, 0 through 10
    last_step: Option<u32>
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> LogProgress {
        LogProgress {
            label: label.into(),
            last_step: None
        }
    }

    pub fn last_step(&self) -> Option<u32> {
        self.last_step
    }
}

impl ProgressSink for LogProgress {
    fn update(&mut self, fraction: f64) {
        let step = (fraction.clamp(0.0, 1.0) * 10.0).floor() as u32;
        if self.last_step.map_or(true, |last| step > last) {
            info!("{}: {}% complete", self.label, step * 10);
            self.last_step = Some(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_steps() {
        let mut progress = LogProgress::new("test");
        assert_eq!(progress.last_step(), None);
        progress.update(0.0);
        assert_eq!(progress.last_step(), Some(0));
        progress.update(0.05);
        assert_eq!(progress.last_step(), Some(0));
        progress.update(0.37);
        assert_eq!(progress.last_step(), Some(3));
        // never goes backwards
        progress.update(0.2);
        assert_eq!(progress.last_step(), Some(3));
        progress.update(1.5);
        assert_eq!(progress.last_step(), Some(10));
    }
}
