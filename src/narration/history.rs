use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

/// The last few phrases drawn from the personality's pools.
#[derive(Debug, Clone)]
pub struct RecentHistory {
    window: usize,
    recent: VecDeque<&'static str>,
}

impl RecentHistory {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            recent: VecDeque::with_capacity(window),
        }
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.recent.iter().any(|p| *p == phrase)
    }

    pub fn last(&self) -> Option<&'static str> {
        self.recent.back().copied()
    }

    pub fn remember(&mut self, phrase: &'static str) {
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(phrase);
    }

    /// Picks a phrase not spoken within the window. When the pool is too
    /// small for that, any phrase other than the immediately preceding one
    /// is accepted. A single-phrase pool always yields that phrase.
    pub fn pick<R: Rng + ?Sized>(
        &mut self,
        pool: &'static [&'static str],
        rng: &mut R,
    ) -> Option<&'static str> {
        let fresh: Vec<&'static str> = pool.iter().copied().filter(|p| !self.contains(p)).collect();
        let choice = if !fresh.is_empty() {
            fresh.choose(rng).copied()
        } else {
            let last = self.last();
            let not_last: Vec<&'static str> =
                pool.iter().copied().filter(|p| Some(*p) != last).collect();
            if not_last.is_empty() {
                pool.choose(rng).copied()
            } else {
                not_last.choose(rng).copied()
            }
        }?;
        self.remember(choice);
        Some(choice)
    }
}
