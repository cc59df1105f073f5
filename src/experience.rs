use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::MatchEvent;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub level: f32,
    pub experience: f32,
}

/// Piecewise-linear experience thresholds, clamped past the first and last key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct ExperienceCurve {
    keys: Vec<CurveKey>,
}

impl Default for ExperienceCurve {
    fn default() -> Self {
        Self::new(vec![
            CurveKey {
                level: 0.0,
                experience: 0.0,
            },
            CurveKey {
                level: 1.0,
                experience: 100.0,
            },
            CurveKey {
                level: 5.0,
                experience: 900.0,
            },
            CurveKey {
                level: 10.0,
                experience: 3_000.0,
            },
        ])
    }
}

impl From<Vec<CurveKey>> for ExperienceCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<ExperienceCurve> for Vec<CurveKey> {
    fn from(curve: ExperienceCurve) -> Self {
        curve.keys
    }
}

impl ExperienceCurve {
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.level.total_cmp(&b.level));
        Self { keys }
    }

    pub fn evaluate(&self, level: f32) -> f32 {
        let Some(first) = self.keys.first() else {
            return 0.0;
        };
        if level <= first.level {
            return first.experience;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if level <= b.level {
                let span = b.level - a.level;
                if span <= f32::EPSILON {
                    return b.experience;
                }
                let t = (level - a.level) / span;
                return a.experience + (b.experience - a.experience) * t;
            }
        }
        self.keys.last().map_or(0.0, |last| last.experience)
    }

    /// Threshold of `level` truncated to whole experience points.
    pub fn threshold(&self, level: u32) -> u32 {
        self.evaluate(level as f32).max(0.0) as u32
    }

    pub fn max_level(&self) -> u32 {
        self.keys
            .last()
            .map_or(0, |last| last.level.max(0.0).floor() as u32)
    }
}

/// Ghost-side experience fed by pellets the ghosts collect.
#[derive(Clone, Debug)]
pub struct ExperienceTracker {
    curve: ExperienceCurve,
    level: u32,
    total: u32,
    previous_threshold: u32,
    next_threshold: u32,
}

impl ExperienceTracker {
    pub fn new(curve: ExperienceCurve) -> Self {
        let mut tracker = Self {
            curve,
            level: 0,
            total: 0,
            previous_threshold: 0,
            next_threshold: 0,
        };
        tracker.reset();
        tracker
    }

    pub fn reset(&mut self) {
        self.level = 0;
        self.total = 0;
        self.refresh_thresholds();
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Experience earned inside the current level and the size of that level.
    pub fn level_span(&self) -> (u32, u32) {
        (
            self.total.saturating_sub(self.previous_threshold),
            self.next_threshold.saturating_sub(self.previous_threshold),
        )
    }

    /// Fill fraction of the current level in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        let (earned, span) = self.level_span();
        if span == 0 {
            return 1.0;
        }
        (earned as f32 / span as f32).clamp(0.0, 1.0)
    }

    /// Adds experience and returns how many levels were gained.
    pub fn add(&mut self, amount: u32, events: &mut Vec<MatchEvent>) -> u32 {
        self.total = self.total.saturating_add(amount);
        let mut gained = 0;
        while self.level < self.curve.max_level() && self.total >= self.next_threshold {
            self.level += 1;
            gained += 1;
            self.refresh_thresholds();
            info!(level = self.level, total = self.total, "ghost experience level up");
            events.push(MatchEvent::ExperienceLevelUp { level: self.level });
        }
        gained
    }

    fn refresh_thresholds(&mut self) {
        self.previous_threshold = self.curve.threshold(self.level);
        self.next_threshold = self.curve.threshold(self.level + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> ExperienceCurve {
        ExperienceCurve::new(vec![
            CurveKey {
                level: 3.0,
                experience: 300.0,
            },
            CurveKey {
                level: 0.0,
                experience: 0.0,
            },
        ])
    }

    #[test]
    fn curve_interpolates_and_clamps() {
        let curve = ExperienceCurve::default();
        assert_eq!(curve.evaluate(-1.0), 0.0);
        assert_eq!(curve.evaluate(1.0), 100.0);
        assert_eq!(curve.evaluate(3.0), 500.0);
        assert_eq!(curve.evaluate(50.0), 3_000.0);
        assert_eq!(curve.max_level(), 10);
        assert_eq!(ExperienceCurve::new(Vec::new()).evaluate(2.0), 0.0);
    }

    #[test]
    fn adding_experience_crosses_several_levels() {
        let mut tracker = ExperienceTracker::new(linear());
        let mut events = Vec::new();

        assert_eq!(tracker.add(50, &mut events), 0);
        assert_eq!(tracker.progress(), 0.5);
        assert_eq!(tracker.add(170, &mut events), 2);
        assert_eq!(tracker.level(), 2);
        assert_eq!(tracker.level_span(), (20, 100));
        assert_eq!(
            events,
            vec![
                MatchEvent::ExperienceLevelUp { level: 1 },
                MatchEvent::ExperienceLevelUp { level: 2 },
            ]
        );
    }

    #[test]
    fn level_stops_at_last_key() {
        let mut tracker = ExperienceTracker::new(linear());
        let mut events = Vec::new();
        tracker.add(10_000, &mut events);
        assert_eq!(tracker.level(), 3);
        assert_eq!(tracker.progress(), 1.0);

        tracker.reset();
        assert_eq!(tracker.level(), 0);
        assert_eq!(tracker.total(), 0);
    }

    #[test]
    fn curve_reads_json_key_list() {
        let curve: ExperienceCurve =
            serde_json::from_str(r#"[{"level":0,"experience":0},{"level":2,"experience":40}]"#)
                .expect("curve should parse");
        assert_eq!(curve.threshold(1), 20);
    }
}
