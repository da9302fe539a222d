// Pod generation: shuffle for the first round of a week, seed by weekly
// standings afterwards, then cut into groups of four.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use super::POD_SIZE;
use crate::league::{Player, PlayerId, WeeklyPlayerPoints};

/// Partition the present players into pods for `round`.
///
/// Round 1 is a uniform shuffle. Later rounds sort by weekly points descending;
/// the sort is stable, so ties keep their order from `present_ids`. The last
/// pod may hold fewer than [`POD_SIZE`] players. Present ids with no matching
/// player are skipped.
pub fn generate_pods<'a, R: Rng + ?Sized>(
    players: &'a [Player],
    present_ids: &[PlayerId],
    round: u32,
    weekly_points: &BTreeMap<PlayerId, WeeklyPlayerPoints>,
    rng: &mut R,
) -> Vec<Vec<&'a Player>> {
    let mut present: Vec<&Player> = present_ids
        .iter()
        .filter_map(|id| {
            let found = players.iter().find(|p| p.id == *id);
            if found.is_none() {
                warn!("Skipping unknown present player {} during pod generation", id);
            }
            found
        })
        .collect();

    if round <= 1 {
        present.shuffle(rng);
    } else {
        present.sort_by_key(|p| {
            std::cmp::Reverse(weekly_points.get(&p.id).copied().unwrap_or_default().total())
        });
    }

    present.chunks(POD_SIZE).map(|pod| pod.to_vec()).collect()
}
