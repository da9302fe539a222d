// Weekly achievement roll.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::league::{Achievement, AchievementId};

/// Pick the achievements active for a week.
///
/// Every always-on achievement is included, plus a sample without replacement
/// of `min(count, non_always_on)` from the rest. The combined order carries no
/// meaning.
pub fn roll_active_achievements<R: Rng + ?Sized>(
    catalog: &[Achievement],
    count: u32,
    rng: &mut R,
) -> Vec<AchievementId> {
    let mut active: Vec<AchievementId> = catalog
        .iter()
        .filter(|a| a.always_on)
        .map(|a| a.id)
        .collect();

    let mut candidates: Vec<AchievementId> = catalog
        .iter()
        .filter(|a| !a.always_on)
        .map(|a| a.id)
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(count as usize);

    active.extend(candidates);
    active
}
