use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
type Instant = std::time::Instant;

// `std::time::Instant::now` panics on wasm32-unknown-unknown
#[cfg(target_arch = "wasm32")]
type Instant = chrono::DateTime<chrono::Utc>;

#[cfg(not(target_arch = "wasm32"))]
fn now() -> Instant {
    std::time::Instant::now()
}

#[cfg(target_arch = "wasm32")]
fn now() -> Instant {
    chrono::Utc::now()
}

/// Wall clock point after which a diff stops searching for the optimal script.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    /// `None` never expires.
    pub(crate) fn after(limit: Option<Duration>) -> Self {
        Self(limit.and_then(shift))
    }

    #[cfg(test)]
    pub(crate) fn unbounded() -> Self {
        Self(None)
    }

    pub(crate) fn is_bounded(&self) -> bool {
        self.0.is_some()
    }

    pub(crate) fn expired(&self) -> bool {
        self.0.is_some_and(|at| now() > at)
    }

    #[cfg(test)]
    pub(crate) fn elapsed() -> Self {
        Self(Some(now()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn shift(limit: Duration) -> Option<Instant> {
    now().checked_add(limit)
}

#[cfg(target_arch = "wasm32")]
fn shift(limit: Duration) -> Option<Instant> {
    let limit = chrono::TimeDelta::from_std(limit).ok()?;
    now().checked_add_signed(limit)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Deadline;

    #[test]
    fn test_deadline() {
        assert!(!Deadline::unbounded().expired());
        assert!(!Deadline::after(None).is_bounded());
        assert!(!Deadline::after(Some(Duration::from_secs(3600))).expired());

        let past = Deadline::elapsed();
        std::thread::sleep(Duration::from_millis(2));
        assert!(past.expired());
    }
}
