//! Election of the robot that goes for the ball.
//!
//! Every robot runs the election on its own view of the team. To keep the team from
//! flickering between two chasers with similar chase times, the lower numbered robot of a pair
//! keeps the role within a margin that grows with the chase times, and the margin widens once it
//! is the chaser. A higher numbered robot that already claims the role is listened to once its
//! advantage is large enough.

use itertools::Itertools;

use super::config::ChaseConfig;

/// A robot that takes part in the election.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub number: u8,
    /// Estimated time to reach the ball, in seconds.
    pub chase_time: f32,
    /// Whether the robot was the chaser in the previous frame.
    pub was_chaser: bool,
    /// Whether the robot claims the chaser role in its latest packet.
    pub claims_chaser: bool,
    /// Whether the robot is grabbing, dribbling or kicking the ball.
    pub has_ball: bool,
}

/// Returns the number of the robot that should chase.
///
/// A robot in possession of the ball always wins, me first, then the others by number.
/// Otherwise all candidates, me included, are compared pairwise against the best so far in the
/// order of their numbers. The duel is not transitive, so every robot has to walk the team in
/// the same order to arrive at the same chaser.
pub fn elect(
    me: &Candidate,
    others: impl IntoIterator<Item = Candidate>,
    config: &ChaseConfig,
) -> u8 {
    if me.has_ball {
        return me.number;
    }

    let candidates = others
        .into_iter()
        .filter(|candidate| candidate.number != me.number)
        .chain(std::iter::once(*me))
        .sorted_by_key(|candidate| candidate.number)
        .collect_vec();

    if let Some(holder) = candidates.iter().find(|candidate| candidate.has_ball) {
        return holder.number;
    }

    candidates
        .into_iter()
        .reduce(|best, candidate| duel(&best, &candidate, config))
        .map_or(me.number, |chaser| chaser.number)
}

/// The winner of a pair of candidates.
fn duel(a: &Candidate, b: &Candidate, config: &ChaseConfig) -> Candidate {
    let (low, high) = if a.number <= b.number { (a, b) } else { (b, a) };

    let advantage = low.chase_time - high.chase_time;
    if advantage <= 0.0 {
        return *low;
    }

    let scale = low.chase_time.min(high.chase_time);
    let margin = if low.was_chaser {
        config.stop_calling_thresh + config.stop_calling_scale * scale
    } else {
        config.call_off_thresh + config.call_off_scale * scale
    };
    let retains = advantage <= margin;
    let listens =
        high.claims_chaser && advantage > config.listen_thresh + config.listen_scale * scale;

    if retains && !listens { *low } else { *high }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(number: u8, chase_time: f32) -> Candidate {
        Candidate {
            number,
            chase_time,
            was_chaser: false,
            claims_chaser: false,
            has_ball: false,
        }
    }

    #[test]
    fn fastest_robot_wins_clear_races() {
        let config = ChaseConfig::default();
        let me = candidate(2, 10.0);

        assert_eq!(elect(&me, [candidate(3, 4.0), candidate(4, 6.0)], &config), 3);
        assert_eq!(elect(&me, [candidate(3, 12.0), candidate(4, 11.0)], &config), 2);
    }

    #[test]
    fn equal_chase_times_go_to_the_lower_number() {
        let config = ChaseConfig::default();

        assert_eq!(elect(&candidate(3, 5.0), [candidate(2, 5.0)], &config), 2);
        assert_eq!(elect(&candidate(2, 5.0), [candidate(3, 5.0)], &config), 2);
    }

    #[test]
    fn lower_number_keeps_role_within_margin() {
        let config = ChaseConfig::default();

        // margin is 0.125 + 0.15 * 2.0 = 0.425
        let me = candidate(2, 2.4);
        assert_eq!(elect(&me, [candidate(3, 2.0)], &config), 2);

        let me = candidate(2, 2.5);
        assert_eq!(elect(&me, [candidate(3, 2.0)], &config), 3);
    }

    #[test]
    fn possession_wins_regardless_of_chase_time() {
        let config = ChaseConfig::default();
        let me = candidate(2, 0.0);
        let holder = Candidate {
            has_ball: true,
            ..candidate(4, 30.0)
        };

        assert_eq!(elect(&me, [candidate(3, 1.0), holder], &config), 4);

        let me = Candidate {
            has_ball: true,
            ..candidate(3, 30.0)
        };
        assert_eq!(elect(&me, [holder, candidate(2, 0.0)], &config), 3);
    }

    #[test]
    fn claiming_robot_is_listened_to() {
        let config = ChaseConfig::default();

        // stop calling margin is 0.275 + 0.35 * 2.0 = 0.975, listen margin 0.25 + 0.25 * 2.0
        let me = Candidate {
            was_chaser: true,
            ..candidate(2, 2.8)
        };
        assert_eq!(elect(&me, [candidate(3, 2.0)], &config), 2);

        let claimer = Candidate {
            claims_chaser: true,
            ..candidate(3, 2.0)
        };
        assert_eq!(elect(&me, [claimer], &config), 3);
    }

    /// Two robots whose chase time difference oscillates around the thresholds.
    #[test]
    fn oscillating_chase_times_flip_at_most_once() {
        let config = ChaseConfig::default();
        let far = 2.0;
        let mut chaser = None;
        let mut flips = 0;

        for frame in 0..200 {
            let advantage = if frame % 2 == 0 { 0.4 } else { 0.9 };
            let was_chaser = |number| chaser == Some(number);

            let low = Candidate {
                was_chaser: was_chaser(2),
                claims_chaser: was_chaser(2),
                ..candidate(2, far + advantage)
            };
            let high = Candidate {
                was_chaser: was_chaser(3),
                claims_chaser: was_chaser(3),
                ..candidate(3, far)
            };

            // both robots must agree on their shared view
            let winner = elect(&low, [high], &config);
            assert_eq!(elect(&high, [low], &config), winner);

            if chaser.is_some_and(|previous| previous != winner) {
                flips += 1;
            }
            chaser = Some(winner);
        }

        assert!(flips <= 1, "chaser flipped {flips} times");
    }

    #[test]
    fn every_view_elects_the_same_robot() {
        let config = ChaseConfig::default();
        let team = [candidate(2, 2.8), candidate(3, 2.4), candidate(4, 2.0)];

        let elected = team.map(|me| elect(&me, team, &config));
        assert_eq!(elected, [4, 4, 4]);
    }

    #[test]
    fn lost_role_is_won_back_only_below_call_off_margin() {
        let config = ChaseConfig::default();
        let claimer = Candidate {
            was_chaser: true,
            claims_chaser: true,
            ..candidate(3, 2.0)
        };

        // listen margin is 0.75, call off margin 0.425
        assert_eq!(elect(&candidate(2, 2.5), [claimer], &config), 3);
        assert_eq!(elect(&candidate(2, 2.4), [claimer], &config), 2);
    }
}
