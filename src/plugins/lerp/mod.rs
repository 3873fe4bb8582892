//! Fixed duration, fixed step linear interpolation.
//!
//! A [`LerpJob`] holds the interpolation state and advances by exactly one step at a time. A
//! [`LerpTimer`] drives a job from frame deltas using a repeating [`Timer`] whose period is the
//! step interval, so the animation runs the same number of steps whatever the frame rate is.
//! Cancelling an animation is dropping its timer.

use std::time::Duration;

use bevy::prelude::*;

/// Default total duration of an interpolation, in seconds.
pub const LERP_DURATION: f32 = 0.05;
/// Default number of steps an interpolation is split into.
pub const LERP_STEPS: u32 = 16;

/// Values which can be linearly interpolated.
pub trait Lerp: Clone {
    fn lerp(&self, end: &Self, alpha: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, end: &Self, alpha: f32) -> Self {
        self + (end - self) * alpha
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Position and orientation of an object, without scale.
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(translation: Vec3, rotation: Quat) -> Pose {
        Pose {
            translation,
            rotation,
        }
    }

    /// Copy this pose onto a transform, leaving its scale untouched.
    pub fn apply_to(&self, transform: &mut Transform) {
        transform.translation = self.translation;
        transform.rotation = self.rotation;
    }
}

impl From<&Transform> for Pose {
    fn from(transform: &Transform) -> Self {
        Pose::new(transform.translation, transform.rotation)
    }
}

impl Lerp for Pose {
    fn lerp(&self, end: &Self, alpha: f32) -> Self {
        Pose {
            translation: self.translation.lerp(end.translation, alpha),
            rotation: self.rotation.slerp(end.rotation, alpha),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Result of advancing a [`LerpJob`] by one step.
pub enum LerpStep<T> {
    Running(T),
    /// The job reached its end value, which is reported exactly.
    Finished(T),
}

impl<T> LerpStep<T> {
    pub fn value(&self) -> &T {
        match self {
            LerpStep::Running(value) | LerpStep::Finished(value) => value,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, LerpStep::Finished(_))
    }
}

#[derive(Debug, Clone)]
pub struct LerpJob<T: Lerp> {
    start: T,
    end: T,
    completed_steps: u32,
    steps: u32,
    duration: f32,
}

impl<T: Lerp> LerpJob<T> {
    /// Create a job using the default timing.
    pub fn new(start: T, end: T) -> LerpJob<T> {
        LerpJob::with_timing(start, end, LERP_DURATION, LERP_STEPS)
    }

    /// Create a job running `steps` steps over `duration` seconds. A duration which is not a
    /// positive number makes an instant job, finishing on its first step.
    pub fn with_timing(start: T, end: T, duration: f32, steps: u32) -> LerpJob<T> {
        let instant = !(duration.is_finite() && duration > 0.);
        LerpJob {
            start,
            end,
            completed_steps: 0,
            steps: if instant { 1 } else { steps.max(1) },
            duration: if instant { 0. } else { duration },
        }
    }

    /// Time between two steps.
    pub fn step_interval(&self) -> f32 {
        self.duration / self.steps as f32
    }

    /// Advance the job by one step.
    ///
    /// The elapsed time is tracked as a step count so the job always terminates after exactly
    /// `steps` steps. On the terminal step the end value is returned as is and the job rewinds,
    /// ready to be run again.
    pub fn step(&mut self) -> LerpStep<T> {
        self.completed_steps += 1;
        if self.completed_steps >= self.steps {
            self.completed_steps = 0;
            return LerpStep::Finished(self.end.clone());
        }
        let alpha = (self.completed_steps as f32 / self.steps as f32).clamp(0., 1.);
        LerpStep::Running(self.start.lerp(&self.end, alpha))
    }

    /// Skip the remaining steps, rewinding the job.
    pub fn finish(&mut self) -> LerpStep<T> {
        self.completed_steps = 0;
        LerpStep::Finished(self.end.clone())
    }
}

#[derive(Debug, Clone)]
/// Drives a [`LerpJob`] with a repeating timer ticking once per step interval.
pub struct LerpTimer<T: Lerp> {
    job: LerpJob<T>,
    /// `None` for jobs whose step interval does not fit a `Duration`, or rounds down to nothing.
    timer: Option<Timer>,
}

impl<T: Lerp> LerpTimer<T> {
    pub fn new(job: LerpJob<T>) -> LerpTimer<T> {
        let timer = Duration::try_from_secs_f32(job.step_interval())
            .ok()
            .filter(|interval| !interval.is_zero())
            .map(|interval| Timer::new(interval, TimerMode::Repeating));
        LerpTimer { job, timer }
    }

    /// Tick the timer by a frame delta and run one job step per elapsed interval.
    ///
    /// Returns the most recent step, or `None` when no interval elapsed during this frame.
    /// Stops at the terminal step even when more intervals elapsed. Jobs without a timer run to
    /// completion on their first advance.
    pub fn advance(&mut self, delta: Duration) -> Option<LerpStep<T>> {
        let timer = match &mut self.timer {
            Some(timer) => timer,
            None => return Some(self.job.finish()),
        };
        timer.tick(delta);
        let mut latest = None;
        for _ in 0..timer.times_finished_this_tick() {
            let step = self.job.step();
            let finished = step.is_finished();
            latest = Some(step);
            if finished {
                break;
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn default_timing() {
        let job = LerpJob::new(0f32, 1.);
        assert_eq!(job.step_interval(), 0.05 / 16.);
    }

    #[test]
    fn job_terminates_after_all_steps_on_exact_end() {
        let mut job = LerpJob::new(90f32, 50.);
        for i in 1..LERP_STEPS {
            match job.step() {
                LerpStep::Running(value) => {
                    let expected = 90. - 40. * i as f32 / LERP_STEPS as f32;
                    assert!((value - expected).abs() < 1e-4);
                }
                LerpStep::Finished(_) => panic!("finished early at step {}", i),
            }
        }
        assert_eq!(job.step(), LerpStep::Finished(50.));
        // Rewound, ready to run again
        assert_eq!(job.step(), LerpStep::Running(87.5));
    }

    #[test]
    fn values_never_overshoot() {
        let mut job = LerpJob::with_timing(0f32, 10., 1., 3);
        let mut values = Vec::new();
        loop {
            let step = job.step();
            values.push(*step.value());
            if step.is_finished() {
                break;
            }
        }
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| (0. ..=10.).contains(v)));
        assert_eq!(values.last(), Some(&10.));
    }

    #[test]
    fn timer_runs_one_step_per_interval() {
        let job = LerpJob::new(0f32, 16.);
        let interval = Duration::from_secs_f32(job.step_interval());
        let mut timer = LerpTimer::new(job);

        let mut ticks = 0;
        let last = loop {
            ticks += 1;
            let step = timer.advance(interval).expect("an interval elapsed");
            if step.is_finished() {
                break step;
            }
            assert!(ticks < 100, "lerp did not terminate");
        };
        assert_eq!(ticks, 16);
        assert_eq!(last, LerpStep::Finished(16.));
    }

    #[test]
    fn timer_catches_up_on_long_frames() {
        let mut timer = LerpTimer::new(LerpJob::new(0f32, 16.));
        // A 60 Hz frame spans five step intervals.
        let step = timer.advance(Duration::from_secs_f32(1. / 60.)).unwrap();
        assert!((*step.value() - 5.).abs() < 1e-4);

        // A very long frame finishes the job without overshooting.
        let step = timer.advance(Duration::from_secs(1)).unwrap();
        assert_eq!(step, LerpStep::Finished(16.));
    }

    #[test]
    fn timer_reports_nothing_between_intervals() {
        let mut timer = LerpTimer::new(LerpJob::new(0f32, 1.));
        assert_eq!(timer.advance(Duration::from_micros(100)), None);
    }

    #[test]
    fn degenerate_durations_finish_on_first_advance() {
        for duration in [0., -1., f32::INFINITY, f32::NAN, 1e-30, 1e30] {
            let mut timer = LerpTimer::new(LerpJob::with_timing(0f32, 4., duration, 16));
            assert_eq!(
                timer.advance(Duration::from_millis(16)),
                Some(LerpStep::Finished(4.)),
                "duration {}",
                duration
            );
        }
    }

    #[test]
    fn pose_interpolation() {
        let start = Pose::new(Vec3::ZERO, Quat::IDENTITY);
        let end = Pose::new(Vec3::new(0., 0., -160.), Quat::from_rotation_y(FRAC_PI_2));
        let mid = start.lerp(&end, 0.5);
        assert!(mid.translation.abs_diff_eq(Vec3::new(0., 0., -80.), 1e-4));
        assert!(mid
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2 / 2.), 1e-4));
    }
}
