//! The retry ladder the generator climbs when a fill fails: widen the word-difficulty band a few
//! times, then move on to the next candidate template, then give up.
//!
//! The ladder is a pure state machine. The generator performs the work each state calls for and
//! reports what happened as a [`RetryEvent`].

use crate::word_index::DifficultyBand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Check whether the template can possibly be filled from the index.
    SelectTemplate { template: usize },
    /// Extract fresh slots and build their domains for the current band.
    InitDomains { template: usize, band_try: usize },
    Solve { template: usize, band_try: usize },
    /// A fill was found; finalize it.
    Accept { template: usize, band_try: usize },
    WidenBand { template: usize, band_try: usize },
    NextTemplate { template: usize },
    /// Every template and band has been tried.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEvent {
    TemplateViable,
    TemplateRejected,
    DomainsReady,
    DomainEmpty,
    Solved,
    Unsolved,
    /// Proceed from a bookkeeping state.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLadder {
    template_count: usize,
    band_tries: usize,
}

impl RetryLadder {
    pub fn new(template_count: usize, band_tries: usize) -> Self {
        Self {
            template_count,
            band_tries: band_tries.max(1),
        }
    }

    pub fn start(&self) -> RetryState {
        if self.template_count == 0 {
            RetryState::Exhausted
        } else {
            RetryState::SelectTemplate { template: 0 }
        }
    }

    /// The state following `state` once `event` has happened. An event that doesn't apply to the
    /// current state leaves it unchanged.
    pub fn next(&self, state: RetryState, event: RetryEvent) -> RetryState {
        use RetryEvent::*;
        use RetryState::*;

        match (state, event) {
            (SelectTemplate { template }, TemplateViable) => InitDomains { template, band_try: 0 },
            (SelectTemplate { template }, TemplateRejected) => NextTemplate { template },

            (InitDomains { template, band_try }, DomainsReady) => Solve { template, band_try },
            (InitDomains { template, band_try }, DomainEmpty) => WidenBand { template, band_try },

            (Solve { template, band_try }, Solved) => Accept { template, band_try },
            (Solve { template, band_try }, Unsolved) => WidenBand { template, band_try },

            (WidenBand { template, band_try }, Continue) => {
                if band_try + 1 < self.band_tries {
                    InitDomains { template, band_try: band_try + 1 }
                } else {
                    NextTemplate { template }
                }
            }

            (NextTemplate { template }, Continue) => {
                if template + 1 < self.template_count {
                    SelectTemplate { template: template + 1 }
                } else {
                    Exhausted
                }
            }

            (state, _) => state,
        }
    }

    /// The band to use on the given try: the base band, then progressively wider, with the last
    /// of several tries accepting any word.
    pub fn band_for_try(&self, base: DifficultyBand, band_try: usize, widen_step: f64) -> DifficultyBand {
        if self.band_tries > 1 && band_try + 1 >= self.band_tries {
            DifficultyBand::FULL
        } else {
            base.widened(widen_step * band_try as f64)
        }
    }
}
