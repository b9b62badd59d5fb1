/// Running totals the backend keeps about flushed packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub packets_flushed: u64,
    pub bytes_flushed: u64,
}

/// Answers the tracer core's "is the backend full?" question before it opens a new packet.
///
/// Returning `true` makes the tracer core discard events instead of opening a packet.
pub trait CapacityPolicy {
    fn is_backend_full(&self, stats: &BackendStats) -> bool;
}

/// The backend always accepts another packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFull;

impl CapacityPolicy for NeverFull {
    fn is_backend_full(&self, _stats: &BackendStats) -> bool {
        false
    }
}

impl<F> CapacityPolicy for F
where
    F: Fn(&BackendStats) -> bool,
{
    fn is_backend_full(&self, stats: &BackendStats) -> bool {
        self(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_full_ignores_activity() {
        let busy = BackendStats {
            packets_flushed: u64::MAX,
            bytes_flushed: u64::MAX,
        };
        assert!(!NeverFull.is_backend_full(&BackendStats::default()));
        assert!(!NeverFull.is_backend_full(&busy));
    }

    #[test]
    fn closures_are_policies() {
        let limit = |stats: &BackendStats| stats.packets_flushed >= 2;
        let mut stats = BackendStats::default();
        assert!(!limit.is_backend_full(&stats));
        stats.packets_flushed = 2;
        assert!(limit.is_backend_full(&stats));
    }
}
