// Placement and achievement point rules.

use crate::league::{Achievement, AchievementId};

pub const MAX_ACHIEVEMENT_POINTS: u32 = 99;

/// Points for a finishing position: 1st=4, 2nd=3, 3rd=2, 4th=1.
///
/// Anything outside 1..=4 scores 0.
pub fn placement_points(place: u8) -> i64 {
    match place {
        1 => 4,
        2 => 3,
        3 => 2,
        4 => 1,
        _ => 0,
    }
}

/// Sum of catalog points for `ids`. Ids missing from the catalog count as 0.
pub fn achievement_points(ids: &[AchievementId], catalog: &[Achievement]) -> i64 {
    ids.iter()
        .filter_map(|id| catalog.iter().find(|a| a.id == *id))
        .map(|a| i64::from(a.points))
        .sum()
}
