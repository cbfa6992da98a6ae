use rand::seq::IteratorRandom;
use rand::thread_rng;
use strum::{EnumIter, FromRepr, IntoEnumIterator, VariantArray};

use crate::env::{DiscreteActionSpace, Environment, Report, Transition};

/// Width of the simulated field in pixels
pub const SCREEN_WIDTH: i32 = 1500;
/// Height of the simulated field in pixels
pub const SCREEN_HEIGHT: i32 = 500;
/// Pixels per meter
pub const SCALE: i32 = 20;
/// Sprite dimension of the drone, offsets the distance measurement
pub const DRONE_DIM: i32 = 2;
/// Maximum discrete speed
pub const MAX_SPEED: i32 = 5;
/// Meters within which the drone has control authority over the approach
pub const CONTROL_WINDOW_M: i32 = 30;
/// Discretized distance reported when the target is not resolvable
pub const DISTANCE_SENTINEL: i32 = 31;
/// Inclusive band of distances in meters counting as a successful stop
pub const TARGET_BAND: (i32, i32) = (0, 5);

/// Observed state, `(speed, distance)` with distance clamped to the sentinel range
pub type State = (usize, usize);

/// Speed adjustments available to the [`DroneApproach`] agent
#[derive(FromRepr, EnumIter, VariantArray, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Maneuver {
    Accelerate = 0,
    Decelerate = 1,
    Hold = 2,
}

impl From<usize> for Maneuver {
    fn from(value: usize) -> Self {
        Self::from_repr(value).expect("Maneuver::from is only called with valid values [0, 2]")
    }
}

/// Read-only positional snapshot for an external rendering layer
///
/// All values are pixel x-coordinates except `drone` and `target`, which are full
/// pixel positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub drone: (i32, i32),
    pub target: (i32, i32),
    pub marker_5m: i32,
    pub marker_7m: i32,
    pub marker_30m: i32,
}

/// A one-dimensional drone approach environment
///
/// The drone sits at a fixed position while the target drifts toward it at the
/// drone's closing speed. The agent adjusts that speed one unit per tick, and
/// succeeds by coming to rest within [`TARGET_BAND`] meters of the target.
/// Distances of [`DISTANCE_SENTINEL`] meters or more are collapsed to the
/// sentinel, modeling a target outside sensing range.
///
/// Intended for use with a [`QTableAgent`](crate::algo::QTableAgent)
#[derive(Debug, Clone)]
pub struct DroneApproach {
    drone: (i32, i32),
    target: (i32, i32),
    spawn: Option<(i32, i32)>,
    marker_5m: i32,
    marker_7m: i32,
    marker_30m: i32,
    speed: i32,
    distance: i32,
    speed_step: i32,
    pub report: Report,
}

impl DroneApproach {
    pub fn new() -> Self {
        let mut env = Self {
            drone: (SCREEN_WIDTH / 10, SCREEN_HEIGHT / 2),
            target: (0, 0),
            spawn: None,
            marker_5m: 0,
            marker_7m: 0,
            marker_30m: 0,
            speed: 1,
            distance: 0,
            speed_step: 1,
            report: Report::new(vec!["reward", "steps"]),
        };
        env.reset();
        env
    }

    /// Set the target position used by subsequent [`reset`](Environment::reset) calls
    ///
    /// `None` places the target out of sensing range, so episodes start at the
    /// distance sentinel.
    pub fn set_target(&mut self, target: Option<(i32, i32)>) {
        self.spawn = target;
    }

    /// Snap an arbitrary pixel x-coordinate to the center of its nearest grid cell
    ///
    /// Used to turn a pointer click into a target position for [`set_target`](Self::set_target).
    /// Ties between two grid lines resolve to the lower one.
    pub fn snap_target(x: i32) -> (i32, i32) {
        let snapped = (0..SCREEN_WIDTH)
            .step_by(SCALE as usize)
            .min_by_key(|p| (p - x).abs())
            .expect("grid is never empty");
        (snapped + SCALE / 2, SCREEN_HEIGHT / 2)
    }

    /// Positional snapshot for the rendering collaborator
    pub fn render_state(&self) -> RenderState {
        RenderState {
            drone: self.drone,
            target: self.target,
            marker_5m: self.marker_5m,
            marker_7m: self.marker_7m,
            marker_30m: self.marker_30m,
        }
    }

    /// Discretized distance in meters, before sentinel clamping
    pub fn raw_distance(&self) -> i32 {
        self.distance
    }

    fn observe(&self) -> State {
        (
            self.speed as usize,
            self.distance.clamp(0, DISTANCE_SENTINEL) as usize,
        )
    }
}

impl Default for DroneApproach {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for DroneApproach {
    type State = State;
    type Action = Maneuver;

    fn step(&mut self, action: Self::Action) -> Transition<Self::State> {
        // Speed is only adjustable once the target enters the control window.
        // The step counter tracks ticks spent inside it, held speed included.
        if self.target.0 <= self.marker_30m {
            match action {
                Maneuver::Accelerate => self.speed = (self.speed + 1).min(MAX_SPEED),
                Maneuver::Decelerate => self.speed = (self.speed - 1).max(0),
                Maneuver::Hold => {}
            }
            self.speed_step += 1;
        }

        if self.distance < DISTANCE_SENTINEL {
            self.distance -= self.speed;
        } else {
            // Unresolved target closes in at a constant rate
            self.distance -= 1;
        }

        self.target.0 -= self.speed * SCALE;
        self.marker_5m = self.target.0 - 5 * SCALE;
        self.marker_7m = self.target.0 - 7 * SCALE;

        // Success is checked before overshoot: the band takes precedence on the
        // tick the drone enters it, and only a negative raw distance counts as
        // having flown past the target.
        let (reward, done) = if (TARGET_BAND.0..=TARGET_BAND.1).contains(&self.distance) {
            ((10 / self.speed_step) as f32, true)
        } else if self.distance < TARGET_BAND.0 {
            (-10.0, true)
        } else {
            (-1.0, false)
        };

        self.report.entry("steps").and_modify(|x| *x += 1.0);
        self.report.entry("reward").and_modify(|x| *x += reward as f64);

        Transition {
            state: self.observe(),
            reward,
            done,
        }
    }

    fn reset(&mut self) -> Self::State {
        self.speed = 1;
        self.speed_step = 1;
        self.target = self
            .spawn
            .unwrap_or((SCREEN_WIDTH + 1, SCREEN_HEIGHT / 2));
        self.distance = (self.target.0 - (self.drone.0 + DRONE_DIM)).abs() / SCALE;
        self.marker_5m = self.target.0 - 5 * SCALE;
        self.marker_7m = self.target.0 - 7 * SCALE;
        self.marker_30m = self.drone.0 + CONTROL_WINDOW_M * SCALE;
        self.observe()
    }
}

impl DiscreteActionSpace for DroneApproach {
    fn actions(&self) -> Vec<Self::Action> {
        Maneuver::VARIANTS.to_vec()
    }

    fn random_action(&self) -> Self::Action {
        Maneuver::iter().choose(&mut thread_rng()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clamps_far_target_to_sentinel() {
        let mut env = DroneApproach::new();
        env.set_target(Some((1250, 250)));
        let state = env.reset();
        // |1250 - 152| / 20 = 54 meters, beyond sensing range
        assert_eq!(env.raw_distance(), 54);
        assert_eq!(state, (1, DISTANCE_SENTINEL as usize));
    }

    #[test]
    fn reset_without_target_starts_at_sentinel() {
        let mut env = DroneApproach::new();
        env.set_target(None);
        let state = env.reset();
        assert_eq!(state, (1, 31));
        assert_eq!(env.render_state().target.0, SCREEN_WIDTH + 1);
    }

    #[test]
    fn hold_into_band_terminates_with_time_scaled_reward() {
        let mut env = DroneApproach::new();
        env.set_target(Some((750, 250)));
        env.reset();
        env.speed = 2;
        env.distance = 3;
        env.speed_step = 3;

        let t = env.step(Maneuver::Hold);
        assert!(t.done);
        assert_eq!(t.reward, 2.0, "10 / 4 with the counter bumped to 4");
        assert_eq!(t.state, (2, 1));
    }

    #[test]
    fn sentinel_distance_decays_by_one() {
        let mut env = DroneApproach::new();
        env.set_target(None);
        env.reset();
        env.distance = 31;

        let t = env.step(Maneuver::Accelerate);
        assert!(!t.done);
        assert_eq!(t.reward, -1.0);
        assert_eq!(t.state, (1, 30), "speed untouched outside the window");
    }

    #[test]
    fn speed_clamps_inside_control_window() {
        let mut env = DroneApproach::new();
        env.set_target(Some((750, 250)));
        env.reset();
        env.speed = MAX_SPEED;
        env.distance = 20;
        env.step(Maneuver::Accelerate);
        assert_eq!(env.observe().0, MAX_SPEED as usize);

        env.speed = 0;
        env.distance = 20;
        env.step(Maneuver::Decelerate);
        assert_eq!(env.observe().0, 0);
    }

    #[test]
    fn overshoot_is_terminal_with_fixed_penalty() {
        let mut env = DroneApproach::new();
        env.set_target(Some((750, 250)));
        env.reset();
        env.speed = 5;
        env.distance = 4;

        let t = env.step(Maneuver::Hold);
        assert!(t.done);
        assert_eq!(t.reward, -10.0);
        assert_eq!(t.state.1, 0, "observation clamps the negative distance");
    }

    #[test]
    fn success_takes_precedence_over_overshoot() {
        let mut env = DroneApproach::new();
        env.set_target(Some((750, 250)));
        env.reset();
        env.speed = 1;
        env.distance = 1;

        let t = env.step(Maneuver::Hold);
        assert!(t.done);
        assert!(t.reward > 0.0);
    }

    #[test]
    fn snap_target_rounds_to_cell_center() {
        assert_eq!(DroneApproach::snap_target(333), (350, 250));
        assert_eq!(DroneApproach::snap_target(330), (330, 250), "tie goes low");
        assert_eq!(DroneApproach::snap_target(0), (10, 250));
    }

    #[test]
    fn markers_track_the_target() {
        let mut env = DroneApproach::new();
        env.set_target(Some((750, 250)));
        env.reset();
        let before = env.render_state();
        assert_eq!(before.marker_5m, 750 - 100);
        assert_eq!(before.marker_30m, 150 + 600);

        env.step(Maneuver::Hold);
        let after = env.render_state();
        assert_eq!(after.target.0, before.target.0 - env.speed * SCALE);
        assert_eq!(after.marker_5m, after.target.0 - 100);
        assert_eq!(after.marker_30m, before.marker_30m, "drone-side marker is fixed");
    }

    #[test]
    fn report_tracks_episode_totals() {
        let mut env = DroneApproach::new();
        env.set_target(Some((750, 250)));
        env.reset();
        env.step(Maneuver::Hold);
        env.step(Maneuver::Hold);
        assert_eq!(env.report["steps"], 2.0);
        assert_eq!(env.report["reward"], -2.0);
    }
}
