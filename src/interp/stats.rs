//! Per-operator result counters.

use super::PdfResult;
use std::collections::BTreeMap;
use std::fmt::Write;

/// How often each keyword produced each [`PdfResult`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    counts: [BTreeMap<String, u64>; 6],
}

impl RenderStats {
    /// Empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one `result` for `keyword`.
    pub fn record(&mut self, keyword: &str, result: PdfResult) {
        *self.counts[result.index()]
            .entry(keyword.to_string())
            .or_insert(0) += 1;
    }

    /// Times `keyword` returned `result`.
    pub fn count(&self, keyword: &str, result: PdfResult) -> u64 {
        self.counts[result.index()]
            .get(keyword)
            .copied()
            .unwrap_or(0)
    }

    /// Total operators that returned `result`.
    pub fn total(&self, result: PdfResult) -> u64 {
        self.counts[result.index()].values().sum()
    }

    /// Keywords that returned `result`, with their counts.
    pub fn keywords(&self, result: PdfResult) -> impl Iterator<Item = (&str, u64)> {
        self.counts[result.index()]
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Add `other`'s counts into these.
    pub fn merge(&mut self, other: &RenderStats) {
        for result in PdfResult::ALL {
            for (kw, n) in other.keywords(result) {
                *self.counts[result.index()]
                    .entry(kw.to_string())
                    .or_insert(0) += n;
            }
        }
    }

    /// Human-readable table, one section per result with at least one hit.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for result in PdfResult::ALL {
            let total = self.total(result);
            if total == 0 {
                continue;
            }
            let _ = writeln!(out, "{} ({})", result.name(), total);
            for (kw, n) in self.keywords(result) {
                let _ = writeln!(out, "  {:<4} {}", kw, n);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_count() {
        let mut stats = RenderStats::new();
        stats.record("re", PdfResult::Ok);
        stats.record("re", PdfResult::Ok);
        stats.record("foo", PdfResult::Unsupported);
        assert_eq!(stats.count("re", PdfResult::Ok), 2);
        assert_eq!(stats.count("re", PdfResult::Partial), 0);
        assert_eq!(stats.total(PdfResult::Unsupported), 1);
    }

    #[test]
    fn test_report_sections() {
        let mut stats = RenderStats::new();
        stats.record("q", PdfResult::Ok);
        stats.record("sh", PdfResult::NotYetImplemented);
        let report = stats.report();
        assert!(report.contains("Success (1)"));
        assert!(report.contains("Not yet implemented (1)"));
        assert!(!report.contains("Unsupported"));
    }

    #[test]
    fn test_merge() {
        let mut a = RenderStats::new();
        a.record("f", PdfResult::Ok);
        let mut b = RenderStats::new();
        b.record("f", PdfResult::Ok);
        b.record("Tz", PdfResult::Error);
        a.merge(&b);
        assert_eq!(a.count("f", PdfResult::Ok), 2);
        assert_eq!(a.count("Tz", PdfResult::Error), 1);
    }
}
