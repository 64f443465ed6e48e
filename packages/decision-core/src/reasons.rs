//! Decision reasons accumulator (C8).
//!
//! One [`DecisionReasons`] is allocated per decision call; it is never
//! shared across concurrent calls. When reporting is disabled, `add_info`
//! becomes a no-op, but critical/error reasons are always retained so the
//! caller can still inspect them internally even if they are not returned.

/// Severity of an appended reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonLevel {
    Info,
    Critical,
}

/// One ordered reason entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason {
    pub level: ReasonLevel,
    pub message: String,
}

/// Ordered accumulator of human-readable reasoning strings for a single
/// decision call.
#[derive(Debug, Default, Clone)]
pub struct DecisionReasons {
    include_reasons: bool,
    entries: Vec<Reason>,
}

impl DecisionReasons {
    /// A new accumulator. `include_reasons` mirrors `options.IncludeReasons`:
    /// when false, `add_info` is a no-op for public reporting.
    pub fn new(include_reasons: bool) -> Self {
        DecisionReasons {
            include_reasons,
            entries: Vec::new(),
        }
    }

    /// Append an info-level reason. No-op unless reporting is enabled.
    pub fn add_info(&mut self, message: impl Into<String>) {
        if self.include_reasons {
            self.entries.push(Reason {
                level: ReasonLevel::Info,
                message: message.into(),
            });
        }
    }

    /// Append a critical-level reason. Always retained regardless of the
    /// `include_reasons` setting.
    pub fn add_critical(&mut self, message: impl Into<String>) {
        self.entries.push(Reason {
            level: ReasonLevel::Critical,
            message: message.into(),
        });
    }

    /// All reasons appended so far, in append order.
    pub fn entries(&self) -> &[Reason] {
        &self.entries
    }

    /// The subset a public caller should see: every entry if reporting is
    /// enabled, otherwise only critical-level entries.
    pub fn reportable(&self) -> Vec<&Reason> {
        if self.include_reasons {
            self.entries.iter().collect()
        } else {
            self.entries
                .iter()
                .filter(|r| r.level == ReasonLevel::Critical)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_info_noop_when_reporting_disabled() {
        let mut reasons = DecisionReasons::new(false);
        reasons.add_info("some info");
        assert!(reasons.entries().is_empty());
    }

    #[test]
    fn add_critical_always_retained() {
        let mut reasons = DecisionReasons::new(false);
        reasons.add_critical("matcher missing");
        assert_eq!(reasons.entries().len(), 1);
        assert_eq!(reasons.reportable().len(), 1);
    }

    #[test]
    fn reportable_filters_info_when_disabled() {
        let mut reasons = DecisionReasons::new(false);
        reasons.add_critical("boom");
        reasons.add_info("ignored");
        assert_eq!(reasons.reportable().len(), 1);
        assert_eq!(reasons.reportable()[0].message, "boom");
    }

    #[test]
    fn ordering_preserved_when_enabled() {
        let mut reasons = DecisionReasons::new(true);
        reasons.add_info("first");
        reasons.add_critical("second");
        reasons.add_info("third");
        let msgs: Vec<_> = reasons.entries().iter().map(|r| r.message.as_str()).collect();
        assert_eq!(msgs, vec!["first", "second", "third"]);
    }
}
