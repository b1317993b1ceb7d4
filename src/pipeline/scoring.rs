use rand::Rng;

pub const MIN_IMPACT_SCORE: u32 = 1;
pub const MAX_IMPACT_SCORE: u32 = 5;

/// How an action's impact score is chosen when the draft doesn't say.
///
/// `Random` is a placeholder heuristic (uniform in 1..=5), not an
/// environmental metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImpactScorer {
    #[default]
    Random,
    Fixed(u32),
}

impl ImpactScorer {
    pub fn score(&self, requested: Option<u32>) -> u32 {
        if let Some(score) = requested.filter(|s| *s >= MIN_IMPACT_SCORE) {
            return score;
        }

        match self {
            Self::Random => rand::thread_rng().gen_range(MIN_IMPACT_SCORE..=MAX_IMPACT_SCORE),
            Self::Fixed(score) => (*score).max(MIN_IMPACT_SCORE),
        }
    }
}
