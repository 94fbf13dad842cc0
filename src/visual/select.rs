use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::visual::provider::Candidate;

/// Picks one candidate out of a provider's result list.
pub trait SelectionPolicy: Send + Sync + std::fmt::Debug {
    fn select<'a>(&self, candidates: &'a [Candidate], seed: u64) -> Option<&'a Candidate>;
}

/// Largest frame wins; ties keep provider order.
#[derive(Clone, Copy, Debug, Default)]
pub struct HighestResolution;

impl SelectionPolicy for HighestResolution {
    fn select<'a>(&self, candidates: &'a [Candidate], _seed: u64) -> Option<&'a Candidate> {
        candidates
            .iter()
            .reduce(|best, c| if c.pixels() > best.pixels() { c } else { best })
    }
}

/// Seeded random pick among the `n` largest candidates.
#[derive(Clone, Copy, Debug)]
pub struct RandomTopN {
    pub n: usize,
}

impl SelectionPolicy for RandomTopN {
    fn select<'a>(&self, candidates: &'a [Candidate], seed: u64) -> Option<&'a Candidate> {
        let mut ranked: Vec<&Candidate> = candidates.iter().collect();
        ranked.sort_by(|a, b| b.pixels().cmp(&a.pixels()));
        ranked.truncate(self.n.max(1));
        let mut rng = StdRng::seed_from_u64(seed);
        ranked.choose(&mut rng).copied()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionPolicyConfig {
    #[default]
    HighestResolution,
    RandomTopN { n: usize },
}

impl SelectionPolicyConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if let Self::RandomTopN { n: 0 } = self {
            return Err(ReelError::validation("random_top_n requires n >= 1"));
        }
        Ok(())
    }

    pub fn build(&self) -> Box<dyn SelectionPolicy> {
        match *self {
            Self::HighestResolution => Box::new(HighestResolution),
            Self::RandomTopN { n } => Box::new(RandomTopN { n }),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/visual/select.rs"]
mod tests;
