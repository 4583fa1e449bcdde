//! Cooperative progress reporting and cancellation.

use super::{Error, Result};

/// Probe polled by long-running derivations.
///
/// The derivation calls [`ProgressProbe::update`] every few hundred
/// vertices; returning `false` requests cancellation, which surfaces as
/// [`Error::Cancelled`] with no partial result published.
pub trait ProgressProbe {
    /// Report progress; return `false` to cancel.
    fn update(&mut self, completed: usize, total: usize) -> bool;
}

/// A probe that never cancels; used when the caller supplies none.
pub struct RunToCompletion;

impl ProgressProbe for RunToCompletion {
    fn update(&mut self, _completed: usize, _total: usize) -> bool {
        true
    }
}

impl<F: FnMut(usize, usize) -> bool> ProgressProbe for F {
    fn update(&mut self, completed: usize, total: usize) -> bool {
        self(completed, total)
    }
}

/// Poll a probe and translate a cancellation request into an error.
pub fn check_cancelled(
    probe: &mut dyn ProgressProbe,
    completed: usize,
    total: usize,
) -> Result<()> {
    if probe.update(completed, total) {
        Ok(())
    } else {
        Err(Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_to_completion_never_cancels() {
        let mut probe = RunToCompletion;
        assert!(check_cancelled(&mut probe, 0, 100).is_ok());
    }

    #[test]
    fn test_closure_probe_cancels() {
        let mut probe = |done: usize, _total: usize| done < 50;
        assert!(check_cancelled(&mut probe, 10, 100).is_ok());
        assert!(matches!(
            check_cancelled(&mut probe, 60, 100),
            Err(Error::Cancelled)
        ));
    }
}
