//! When to sort, and from where.

use bevy::log::info;
use bevy::math::Vec3;
use constants::sorting::DEBUG_LOG_INTERVAL;

use crate::config::SortConfiguration;

/// Diagnostics for one sorter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SortStatistics {
    pub sort_count: u32,
    pub last_sort_position: Option<Vec3>,
}

/// Viewpoints one frame sorts for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewpoints {
    Mono(Vec3),
    Stereo { left: Vec3, right: Vec3 },
}

/// Left and right eye positions around a head-centre position.
pub fn eye_positions(center: Vec3, right_axis: Vec3, inter_pupillary_distance: f32) -> (Vec3, Vec3) {
    let offset = right_axis.normalize_or_zero() * (inter_pupillary_distance * 0.5);
    (center - offset, center + offset)
}

/// Sort viewpoints for this frame under `config`.
pub fn viewpoints(center: Vec3, right_axis: Vec3, config: &SortConfiguration) -> Viewpoints {
    if config.separate_eye_sorting {
        let (left, right) = eye_positions(center, right_axis, config.inter_pupillary_distance);
        Viewpoints::Stereo { left, right }
    } else {
        Viewpoints::Mono(center)
    }
}

/// Gates sorts on camera movement.
///
/// A forced sort stays pending until a sort completes or fails for good. A
/// transient failure leaves the scheduler untouched so the next frame
/// retries; a persistent one counts as an attempt, and the next try waits for
/// movement past the threshold or another force.
#[derive(Debug, Clone, Default)]
pub struct SortScheduler {
    last_position: Option<Vec3>,
    last_attempt: Option<Vec3>,
    force_next: bool,
    failed: bool,
    sort_count: u32,
}

impl SortScheduler {
    pub fn should_sort(&self, center: Vec3, config: &SortConfiguration) -> bool {
        if self.force_next || (config.always_update && !self.failed) {
            return true;
        }
        match self.last_attempt {
            None => true,
            Some(last) => center.distance(last) > config.quantization_threshold,
        }
    }

    pub fn force_sort_next_frame(&mut self) {
        self.force_next = true;
    }

    /// Record a failed sort from `center` that retrying in place cannot fix.
    /// The previous sort position and count stay as they were.
    pub fn mark_failed(&mut self, center: Vec3) {
        self.last_attempt = Some(center);
        self.force_next = false;
        self.failed = true;
    }

    /// Record a completed sort from `center`.
    pub fn mark_sorted(&mut self, center: Vec3, config: &SortConfiguration) {
        self.last_position = Some(center);
        self.last_attempt = Some(center);
        self.force_next = false;
        self.failed = false;
        self.sort_count = self.sort_count.wrapping_add(1);

        if config.debug_log && self.sort_count % DEBUG_LOG_INTERVAL == 0 {
            info!(
                "Splat sort #{} at {:?} ({} passes, {}-bit keys)",
                self.sort_count,
                center,
                config.pass_count,
                config.key_bits()
            );
        }
    }

    /// Forget the last position so the next frame sorts.
    pub fn invalidate(&mut self) {
        self.last_attempt = None;
        self.failed = false;
    }

    pub fn statistics(&self) -> SortStatistics {
        SortStatistics {
            sort_count: self.sort_count,
            last_sort_position: self.last_position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_always_sorts() {
        let scheduler = SortScheduler::default();
        assert!(scheduler.should_sort(Vec3::ZERO, &SortConfiguration::default()));
    }

    #[test]
    fn small_moves_are_ignored() {
        let config = SortConfiguration::default();
        let mut scheduler = SortScheduler::default();
        scheduler.mark_sorted(Vec3::ZERO, &config);

        assert!(!scheduler.should_sort(Vec3::new(0.04, 0.0, 0.0), &config));
        assert!(scheduler.should_sort(Vec3::new(0.0, 0.06, 0.0), &config));
    }

    #[test]
    fn force_flag_survives_until_a_sort_completes() {
        let config = SortConfiguration::default();
        let mut scheduler = SortScheduler::default();
        scheduler.mark_sorted(Vec3::ZERO, &config);
        scheduler.force_sort_next_frame();

        // a frame that failed to sort leaves the flag set
        assert!(scheduler.should_sort(Vec3::ZERO, &config));
        assert!(scheduler.should_sort(Vec3::ZERO, &config));

        scheduler.mark_sorted(Vec3::ZERO, &config);
        assert!(!scheduler.should_sort(Vec3::ZERO, &config));
    }

    #[test]
    fn persistent_failure_waits_for_movement_or_force() {
        let config = SortConfiguration::default();
        let mut scheduler = SortScheduler::default();
        scheduler.mark_sorted(Vec3::ZERO, &config);
        scheduler.force_sort_next_frame();

        scheduler.mark_failed(Vec3::X);
        assert!(!scheduler.should_sort(Vec3::X, &config));
        assert!(!scheduler.should_sort(Vec3::new(1.04, 0.0, 0.0), &config));
        assert!(scheduler.should_sort(Vec3::new(1.06, 0.0, 0.0), &config));

        scheduler.force_sort_next_frame();
        assert!(scheduler.should_sort(Vec3::X, &config));

        // a failed attempt is not a sort
        assert_eq!(
            scheduler.statistics(),
            SortStatistics {
                sort_count: 1,
                last_sort_position: Some(Vec3::ZERO),
            }
        );
    }

    #[test]
    fn persistent_failure_pauses_always_update() {
        let config = SortConfiguration {
            always_update: true,
            ..Default::default()
        };
        let mut scheduler = SortScheduler::default();
        scheduler.mark_failed(Vec3::ZERO);
        assert!(!scheduler.should_sort(Vec3::ZERO, &config));

        scheduler.mark_sorted(Vec3::ONE, &config);
        assert!(scheduler.should_sort(Vec3::ONE, &config));
    }

    #[test]
    fn always_update_ignores_threshold() {
        let config = SortConfiguration {
            always_update: true,
            ..Default::default()
        };
        let mut scheduler = SortScheduler::default();
        scheduler.mark_sorted(Vec3::ONE, &config);
        assert!(scheduler.should_sort(Vec3::ONE, &config));
    }

    #[test]
    fn statistics_track_sorts() {
        let config = SortConfiguration::default();
        let mut scheduler = SortScheduler::default();
        scheduler.mark_sorted(Vec3::X, &config);
        scheduler.mark_sorted(Vec3::Y, &config);
        assert_eq!(
            scheduler.statistics(),
            SortStatistics {
                sort_count: 2,
                last_sort_position: Some(Vec3::Y),
            }
        );

        scheduler.invalidate();
        assert!(scheduler.should_sort(Vec3::Y, &config));
    }

    #[test]
    fn eyes_sit_half_ipd_either_side() {
        let (left, right) = eye_positions(Vec3::new(1.0, 2.0, 3.0), Vec3::X, 0.064);
        assert!((left - Vec3::new(0.968, 2.0, 3.0)).length() < 1e-6);
        assert!((right - Vec3::new(1.032, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn viewpoints_follow_stereo_setting() {
        let mono = SortConfiguration::default();
        assert_eq!(viewpoints(Vec3::ZERO, Vec3::X, &mono), Viewpoints::Mono(Vec3::ZERO));

        let stereo = SortConfiguration {
            separate_eye_sorting: true,
            inter_pupillary_distance: 0.1,
            ..Default::default()
        };
        match viewpoints(Vec3::ZERO, Vec3::X, &stereo) {
            Viewpoints::Stereo { left, right } => {
                assert!((left.x + 0.05).abs() < 1e-6);
                assert!((right.x - 0.05).abs() < 1e-6);
            }
            other => panic!("expected stereo viewpoints, got {other:?}"),
        }
    }
}
