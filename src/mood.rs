use crate::config::{MoodStep, StatsWindow};
use crate::item::Stats;
use serde::Serialize;
use std::fmt::{Display, Formatter};

const RISING: [&str; 6] = ["+", "++", "+++", "^", "^^", "^^^"];
const FALLING: [&str; 6] = ["-", "--", "---", "v", "vv", "vvv"];

/// How far a rate moved between two snapshots, as a signed number of ladder steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Mood(pub i8);

impl Mood {
    pub const NONE: Mood = Mood(0);

    /// Bucket the move from `prev` to `curr` into the ladder.
    pub fn bucket(prev: f64, curr: f64, ladder: &[MoodStep]) -> Self {
        if !prev.is_finite() || !curr.is_finite() || prev == curr {
            return Self::NONE;
        }

        let (low, high) = if curr > prev { (prev, curr) } else { (curr, prev) };
        let steps = ladder
            .iter()
            .take_while(|step| high >= low * step.ratio && high - low > step.diff)
            .count()
            .min(i8::MAX as usize) as i8;
        if curr > prev {
            Self(steps)
        } else {
            Self(-steps)
        }
    }

    #[inline]
    pub fn level(&self) -> i8 {
        self.0
    }

    /// The ladder symbol of the level. Levels past the sixth step, reachable with a longer custom
    /// ladder, keep the symbol of the sixth (`^^^` or `vvv`).
    pub fn symbol(&self) -> &'static str {
        let index = usize::from(self.0.unsigned_abs()).min(RISING.len());
        match self.0.signum() {
            1 => RISING[index - 1],
            -1 => FALLING[index - 1],
            _ => "",
        }
    }
}

impl Display for Mood {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "{}", self.symbol())
    }
}

/// The moods of the lifetime, month and week rates of an item present in both snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Moods {
    pub lifetime: Mood,
    pub month: Mood,
    pub week: Mood,
}

impl Moods {
    pub fn compute(prev: &Stats, curr: &Stats, window: StatsWindow, ladder: &[MoodStep]) -> Self {
        Self {
            lifetime: Mood::bucket(
                window.lifetime_ratio(prev),
                window.lifetime_ratio(curr),
                ladder,
            ),
            month: Mood::bucket(window.month_ratio(prev), window.month_ratio(curr), ladder),
            week: Mood::bucket(prev.ratio_7, curr.ratio_7, ladder),
        }
    }

    /// The sum of the three levels when they all point the same way, zero otherwise.
    pub fn score(&self) -> f64 {
        let levels = [self.lifetime.0, self.month.0, self.week.0];
        let rising = levels.iter().all(|level| *level > 0);
        let falling = levels.iter().all(|level| *level < 0);
        if rising || falling {
            levels.iter().map(|level| f64::from(*level)).sum()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MOOD_LADDER;
    use crate::test_utils::stats;

    fn bucket(prev: f64, curr: f64) -> Mood {
        Mood::bucket(prev, curr, &DEFAULT_MOOD_LADDER)
    }

    #[test]
    fn an_unchanged_rate_has_no_mood() {
        assert_eq!(Mood::NONE, bucket(3.0, 3.0));
        assert_eq!("", Mood::NONE.symbol());
    }

    #[test]
    fn a_small_change_is_below_the_first_step() {
        assert_eq!(Mood::NONE, bucket(10.0, 10.2));
    }

    #[test]
    fn climb_the_ladder_with_the_change() {
        assert_eq!(Mood(1), bucket(10.0, 11.0));
        assert_eq!(Mood(2), bucket(10.0, 13.0));
        assert_eq!(Mood(3), bucket(10.0, 16.0));
        assert_eq!(Mood(4), bucket(10.0, 25.0));
        assert_eq!(Mood(5), bucket(10.0, 50.0));
        assert_eq!(Mood(6), bucket(10.0, 100.0));
    }

    #[test]
    fn falls_are_negative() {
        assert_eq!(Mood(-2), bucket(13.0, 10.0));
        assert_eq!("--", bucket(13.0, 10.0).symbol());
        assert_eq!("vvv", bucket(100.0, 10.0).symbol());
    }

    #[test]
    fn the_diff_step_guards_tiny_rates() {
        assert_eq!(Mood::NONE, bucket(0.01, 0.04));
    }

    #[test]
    fn growth_from_nothing_climbs_as_far_as_the_diff_allows() {
        assert_eq!(Mood(3), bucket(0.0, 0.9));
    }

    #[test]
    fn levels_past_the_last_symbol_keep_it() {
        let ladder = (1..=8)
            .map(|step| MoodStep::new(1.0 + f64::from(step), 0.0))
            .collect::<Vec<_>>();

        let mood = Mood::bucket(1.0, 100.0, &ladder);

        assert_eq!(8, mood.level());
        assert_eq!("^^^", mood.symbol());
        assert_eq!("vvv", Mood(-8).symbol());
    }

    #[test]
    fn can_display_a_rising_mood() {
        assert_eq!("^^", Mood(5).to_string());
    }

    #[test]
    fn score_agreeing_moods() {
        let moods = Moods {
            lifetime: Mood(1),
            month: Mood(2),
            week: Mood(4),
        };

        assert_eq!(7.0, moods.score());
    }

    #[test]
    fn mixed_moods_cancel_out() {
        let moods = Moods {
            lifetime: Mood(1),
            month: Mood(-2),
            week: Mood(4),
        };

        assert_eq!(0.0, moods.score());
    }

    #[test]
    fn a_missing_mood_cancels_the_score() {
        let moods = Moods {
            lifetime: Mood(-1),
            month: Mood::NONE,
            week: Mood(-4),
        };

        assert_eq!(0.0, moods.score());
    }

    #[test]
    fn compute_the_moods_of_each_window() {
        let prev = stats(1000, 700, 70);
        let curr = stats(3000, 700, 700);

        let moods = Moods::compute(&prev, &curr, StatsWindow::All, &DEFAULT_MOOD_LADDER);

        assert!(moods.lifetime.level() > 0);
        assert!(moods.month.level() > 0);
        assert!(moods.week.level() > 0);
        assert!(moods.score() > 0.0);
    }
}
