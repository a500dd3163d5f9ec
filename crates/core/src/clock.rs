//! Date source for the current-date line

/// Supplies the current date as a display string
pub trait Clock: Send + Sync {
    /// Today's date
    fn today(&self) -> String;
}

/// Reads the local system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> String {
        chrono::Local::now().format("%Y-%m-%d").to_string()
    }
}

/// Always returns the same date
#[derive(Debug, Clone, Default)]
pub struct FixedClock(pub String);

impl FixedClock {
    /// Create a clock frozen at the given date
    pub fn new(date: impl Into<String>) -> Self {
        Self(date.into())
    }
}

impl Clock for FixedClock {
    fn today(&self) -> String {
        self.0.clone()
    }
}
