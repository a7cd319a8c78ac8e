/// A run has drained once dispatch stopped and every issued request resolved.
#[must_use]
pub(crate) const fn is_drained(dispatch_halted: bool, issued: u64, resolved: u64) -> bool {
    dispatch_halted && issued == resolved
}

/// Edge-triggered wrapper around [`is_drained`]: reports `true` exactly once,
/// on the first observation where the condition holds.
#[derive(Debug, Default)]
pub(crate) struct CompletionLatch {
    signaled: bool,
}

impl CompletionLatch {
    pub(crate) fn observe(&mut self, dispatch_halted: bool, issued: u64, resolved: u64) -> bool {
        if self.signaled || !is_drained(dispatch_halted, issued, resolved) {
            return false;
        }
        self.signaled = true;
        true
    }

    #[must_use]
    pub(crate) const fn has_signaled(&self) -> bool {
        self.signaled
    }
}
