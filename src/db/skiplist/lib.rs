use super::{SKIP_LIST_MAX_LEVEL, SKIP_LIST_P};
use rand::Rng;

/// Returns a random level for a new skiplist node, in `1..=SKIP_LIST_MAX_LEVEL`.
/// Higher levels are geometrically less likely.
pub fn random_level() -> usize {
    let threshold = (SKIP_LIST_P * u32::MAX as f64) as u32;
    let mut rng = rand::rng();
    let mut level = 1;
    while level < SKIP_LIST_MAX_LEVEL && rng.random::<u32>() < threshold {
        level += 1;
    }
    level
}
