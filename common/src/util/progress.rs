use std::io::Write;
use std::time::{Duration, Instant};

// Rate-limits progress output; the first call after construction fires
// immediately.
pub struct Throttle {
    period: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub fn for_progress() -> Self {
        Self::new(Duration::from_millis(200))
    }

    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now < last + self.period => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

// Redraws a single status line in place on stderr.
pub fn update(msg: &str) {
    eprint!("\r\x1b[2K\x1b[36m{}\x1b[0m", msg);
    let _ = std::io::stderr().flush();
}

pub fn clear() {
    eprint!("\r\x1b[2K");
    let _ = std::io::stderr().flush();
}
