use std::time::Instant;

/// Logs how long a named stage took once it goes out of scope.
pub struct StageTimer<'a> {
    name: &'a str,
    started: Instant,
}

impl<'a> StageTimer<'a> {
    pub fn new(name: &'a str) -> StageTimer<'a> {
        StageTimer {
            name,
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

impl<'a> Drop for StageTimer<'a> {
    fn drop(&mut self) {
        tracing::trace!(stage = self.name, elapsed_ms = self.elapsed_ms(), "stage finished");
    }
}
