use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::events::RepaintHandle;

const TOUCH_MINIMUM_MOVE: f32 = 5.0;
const FRICTION: f32 = 10.0;
const MAX_SPEED: f32 = 6.0;

// Release velocity is averaged over the trailing second of samples.
const VELOCITY_WINDOW: Duration = Duration::from_millis(1000);

// Central tap target: 45% of the viewport in each axis.
const TAP_RECT_FRACTION: f32 = 0.45;

/// Windowed average velocity over recent touch positions, in raw touch
/// units per second.
#[derive(Debug)]
struct VelocityTracker {
    samples: VecDeque<(Instant, f32)>,
}

impl VelocityTracker {
    fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    fn add(&mut self, timestamp: Instant, x: f32) {
        while let Some(&(oldest, _)) = self.samples.front() {
            if timestamp.saturating_duration_since(oldest) > VELOCITY_WINDOW {
                self.samples.pop_front();
            } else {
                break;
            }
        }
        self.samples.push_back((timestamp, x));
    }

    fn velocity(&self) -> f32 {
        let (first, last) = match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        let dt = last.0.saturating_duration_since(first.0).as_secs_f32();
        if dt <= 0.0 {
            return 0.0;
        }
        (last.1 - first.1) / dt
    }
}

/// Ephemeral state for one touch-down-to-up cycle.
#[derive(Debug)]
struct TouchSession {
    start_x: f32,
    start_y: f32,
    start_drag_pos: f32,
    start_offset: f32,
    moved: bool,
    velocity: VelocityTracker,
}

/// Momentum decay in progress. Present only while animating.
#[derive(Debug)]
struct Animation {
    start_offset: f32,
    start_speed: f32,
    duration: f32,
    start_time: Instant,
}

/// Converts touch input into the continuous scroll offset and drives the
/// momentum animation that settles it on a tile boundary.
///
/// Strictly single-threaded: the animation is a cooperative step that
/// re-posts itself through the repaint channel instead of running on a
/// timer thread. A generation counter makes cancellation deterministic —
/// a step delivered for a superseded animation is a no-op.
#[derive(Debug)]
pub struct GestureController {
    offset: f32,
    item_count: usize,
    viewport_width: f32,
    viewport_height: f32,
    touch: Option<TouchSession>,
    animation: Option<Animation>,
    generation: u64,
    repaint: RepaintHandle,
}

impl GestureController {
    pub fn new(repaint: RepaintHandle) -> Self {
        Self {
            offset: 0.0,
            item_count: 0,
            viewport_width: 0.0,
            viewport_height: 0.0,
            touch: None,
            animation: None,
            generation: 0,
            repaint,
        }
    }

    /// Current scroll position, always within `[0, item_count - 1]`.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        self.cancel_animation();
        self.item_count = item_count;
        self.offset = self.clamp(self.offset);
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// Jump straight to a tile, cancelling any animation in flight.
    pub fn jump_to(&mut self, index: usize) {
        self.cancel_animation();
        self.offset = self.clamp(index as f32);
    }

    /// Cancel a pending animation; any step already posted for it becomes
    /// a no-op.
    pub fn cancel_animation(&mut self) {
        self.animation = None;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn touch_began(&mut self, x: f32, y: f32, timestamp: Instant) {
        self.cancel_animation();

        let mut velocity = VelocityTracker::new();
        velocity.add(timestamp, x);

        self.touch = Some(TouchSession {
            start_x: x,
            start_y: y,
            start_drag_pos: self.drag_pos(x),
            start_offset: self.offset,
            moved: false,
            velocity,
        });
    }

    pub fn touch_moved(&mut self, x: f32, y: f32, timestamp: Instant) {
        let pos = self.drag_pos(x);
        let session = match self.touch.as_mut() {
            Some(session) => session,
            None => return,
        };

        if !session.moved {
            let dx = (x - session.start_x).abs();
            let dy = (y - session.start_y).abs();
            // Below the threshold this is jitter on a tap, not a drag.
            if dx < TOUCH_MINIMUM_MOVE && dy < TOUCH_MINIMUM_MOVE {
                return;
            }
            session.moved = true;
        }

        session.velocity.add(timestamp, x);
        let dragged = session.start_offset + session.start_drag_pos - pos;
        self.offset = self.clamp(dragged);
        self.repaint.request_frame();
    }

    /// Finish the touch cycle. A drag starts the momentum animation; a tap
    /// inside the central hit rectangle returns the tapped (topmost) tile.
    pub fn touch_ended(&mut self, x: f32, y: f32, timestamp: Instant) -> Option<usize> {
        let mut session = self.touch.take()?;

        if session.moved {
            let pos = self.drag_pos(x);
            let start_offset = self.clamp(session.start_offset + session.start_drag_pos - pos);
            self.offset = start_offset;
            session.velocity.add(timestamp, x);

            // Raw px/sec -> drag-space units/sec; dragging left advances
            // the offset, hence the negation.
            let mut speed = if self.viewport_width > 0.0 {
                -(session.velocity.velocity() / self.viewport_width) * 10.0 / 2.0
            } else {
                0.0
            };
            speed = speed.clamp(-MAX_SPEED, MAX_SPEED);

            self.start_animation(start_offset, speed, timestamp);
            None
        } else {
            if self.item_count == 0 {
                return None;
            }
            let half_w = self.viewport_width * TAP_RECT_FRACTION * 0.5;
            let half_h = self.viewport_height * TAP_RECT_FRACTION * 0.5;
            let dx = (x - self.viewport_width * 0.5).abs();
            let dy = (y - self.viewport_height * 0.5).abs();
            if dx <= half_w && dy <= half_h {
                Some(self.offset.round() as usize)
            } else {
                None
            }
        }
    }

    /// One cooperative animation step. Returns true when the offset moved
    /// and a frame should be drawn; a stale generation does nothing.
    pub fn animation_step(&mut self, generation: u64, now: Instant) -> bool {
        if generation != self.generation {
            debug!("GestureController: dropping stale animation step (gen {})", generation);
            return false;
        }
        let animation = match self.animation.as_ref() {
            Some(animation) => animation,
            None => return false,
        };

        let elapsed = now.saturating_duration_since(animation.start_time).as_secs_f32();
        if elapsed >= animation.duration {
            self.animation = None;
            self.offset = self.clamp(self.offset.round());
            true
        } else {
            let speed = animation.start_speed;
            let mut delta = speed.abs() * elapsed - FRICTION * elapsed * elapsed / 2.0;
            if speed < 0.0 {
                delta = -delta;
            }
            self.offset = self.clamp(animation.start_offset + delta);
            self.repaint.request_animation_step(self.generation);
            true
        }
    }

    /// Derive the decay so it ends exactly on the nearest reachable tile:
    /// travel = v^2 / 2F gives the raw stopping point, the speed is then
    /// re-derived for the rounded, clamped target.
    fn start_animation(&mut self, start_offset: f32, speed: f32, now: Instant) {
        let mut delta = speed * speed / (2.0 * FRICTION);
        if speed < 0.0 {
            delta = -delta;
        }

        let target = self.clamp((start_offset + delta).round());
        let distance = target - start_offset;

        let mut start_speed = (distance.abs() * 2.0 * FRICTION).sqrt();
        if distance < 0.0 {
            start_speed = -start_speed;
        }
        let duration = (start_speed / FRICTION).abs();

        debug!(
            "GestureController: animating {} -> {} (speed {:.2}, duration {:.3}s)",
            start_offset, target, start_speed, duration
        );

        self.animation = Some(Animation {
            start_offset,
            start_speed,
            duration,
            start_time: now,
        });
        self.repaint.request_animation_step(self.generation);
    }

    fn clamp(&self, offset: f32) -> f32 {
        if self.item_count == 0 {
            return 0.0;
        }
        offset.clamp(0.0, (self.item_count - 1) as f32)
    }

    // Normalized drag-space: [0, width] maps onto [-2.5, 2.5].
    fn drag_pos(&self, x: f32) -> f32 {
        if self.viewport_width <= 0.0 {
            return 0.0;
        }
        ((x / self.viewport_width) * 10.0 - 5.0) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RepaintHandle, RepaintRequest};
    use std::sync::mpsc::Receiver;

    fn controller(item_count: usize) -> (GestureController, Receiver<RepaintRequest>) {
        let (repaint, wakeups) = RepaintHandle::channel();
        let mut controller = GestureController::new(repaint);
        controller.set_viewport(800.0, 600.0);
        controller.set_item_count(item_count);
        (controller, wakeups)
    }

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    /// Run the animation to completion with small steps, returning the
    /// number of steps taken.
    fn settle(controller: &mut GestureController, base: Instant) -> usize {
        let generation = controller.generation;
        let mut steps = 0;
        let mut t = 0;
        while controller.is_animating() {
            t += 16;
            controller.animation_step(generation, ms(base, t));
            steps += 1;
            assert!(steps < 10_000, "animation failed to terminate");
        }
        steps
    }

    #[test]
    fn test_offset_clamped_during_drag() {
        let (mut controller, _wakeups) = controller(5);
        let t0 = Instant::now();

        controller.touch_began(400.0, 300.0, t0);
        // Hard fling to the right: would drive the offset negative.
        controller.touch_moved(790.0, 300.0, ms(t0, 50));
        assert_eq!(controller.offset(), 0.0);

        // And far left: would overshoot the last tile.
        controller.touch_moved(10.0, 300.0, ms(t0, 100));
        assert!(controller.offset() <= 4.0);
        assert!(controller.offset() >= 0.0);
    }

    #[test]
    fn test_small_jitter_is_not_a_drag() {
        let (mut controller, wakeups) = controller(5);
        let t0 = Instant::now();

        controller.touch_began(400.0, 300.0, t0);
        controller.touch_moved(402.0, 303.0, ms(t0, 20));
        assert_eq!(controller.offset(), 0.0);
        assert!(wakeups.try_recv().is_err(), "ignored move must not repaint");

        // Inside the central hit rect -> tap on the top tile.
        let tapped = controller.touch_ended(402.0, 303.0, ms(t0, 40));
        assert_eq!(tapped, Some(0));
        assert!(!controller.is_animating());
    }

    #[test]
    fn test_tap_outside_hit_rect_is_ignored() {
        let (mut controller, _wakeups) = controller(5);
        let t0 = Instant::now();

        // 45% of 800 = 360 wide, centered: x in [220, 580].
        controller.touch_began(50.0, 300.0, t0);
        assert_eq!(controller.touch_ended(50.0, 300.0, ms(t0, 30)), None);
    }

    #[test]
    fn test_tap_with_zero_items_never_fires() {
        let (mut controller, _wakeups) = controller(0);
        let t0 = Instant::now();
        controller.touch_began(400.0, 300.0, t0);
        assert_eq!(controller.touch_ended(400.0, 300.0, ms(t0, 30)), None);
    }

    #[test]
    fn test_drag_threshold_crossing_starts_tracking() {
        let (mut controller, wakeups) = controller(10);
        let t0 = Instant::now();

        controller.touch_began(400.0, 300.0, t0);
        controller.touch_moved(320.0, 300.0, ms(t0, 50));
        // Dragging left by 80px moves the offset forward by 80/800*5 = 0.5.
        assert!((controller.offset() - 0.5).abs() < 1e-4);
        assert_eq!(wakeups.try_recv().unwrap(), RepaintRequest::Frame);

        // Release starts a momentum animation even at low speed.
        controller.touch_ended(320.0, 300.0, ms(t0, 100));
        assert!(controller.is_animating());
    }

    #[test]
    fn test_momentum_settle_target_reference_vector() {
        // itemCount=10, release speed 6.0 (max), friction 10, start at 3:
        // delta = 36/20 = 1.8, target = round(4.8) = 5.
        let (mut controller, _wakeups) = controller(10);
        let t0 = Instant::now();

        controller.offset = 3.0;
        controller.start_animation(3.0, MAX_SPEED, t0);
        settle(&mut controller, t0);

        assert_eq!(controller.offset(), 5.0);
    }

    #[test]
    fn test_momentum_settles_on_integer_even_when_clamped() {
        let (mut controller, _wakeups) = controller(4);
        let t0 = Instant::now();

        // Max-speed fling from 2.0 would reach 3.8 unclamped; the target
        // must clamp to the last tile.
        controller.offset = 2.0;
        controller.start_animation(2.0, MAX_SPEED, t0);
        settle(&mut controller, t0);
        assert_eq!(controller.offset(), 3.0);

        // Backwards from the first tile: clamps to 0.
        controller.offset = 0.0;
        controller.start_animation(0.0, -MAX_SPEED, t0);
        settle(&mut controller, t0);
        assert_eq!(controller.offset(), 0.0);
    }

    #[test]
    fn test_animation_always_terminates_on_integer() {
        let speeds = [0.1, 0.7, 1.3, 2.9, 4.2, 5.9, -0.4, -3.3, -6.0];
        for &speed in &speeds {
            let (mut controller, _wakeups) = controller(20);
            let t0 = Instant::now();
            controller.offset = 9.5;
            controller.start_animation(9.5, speed, t0);
            settle(&mut controller, t0);

            let offset = controller.offset();
            assert_eq!(offset, offset.round(), "speed {} left offset {}", speed, offset);
            assert!((0.0..=19.0).contains(&offset));
        }
    }

    #[test]
    fn test_zero_speed_release_snaps_to_nearest_tile() {
        let (mut controller, _wakeups) = controller(10);
        let t0 = Instant::now();
        controller.offset = 3.6;
        controller.start_animation(3.6, 0.0, t0);
        settle(&mut controller, t0);
        assert_eq!(controller.offset(), 4.0);
    }

    #[test]
    fn test_stale_step_after_new_touch_is_noop() {
        let (mut controller, _wakeups) = controller(10);
        let t0 = Instant::now();

        controller.offset = 3.0;
        controller.start_animation(3.0, MAX_SPEED, t0);
        let stale_generation = controller.generation;
        controller.animation_step(stale_generation, ms(t0, 100));
        let mid_flight = controller.offset();
        assert!(mid_flight > 3.0);

        // A new touch cancels; the posted step for the old animation must
        // not move the offset.
        controller.touch_began(400.0, 300.0, ms(t0, 120));
        let frozen = controller.offset();
        assert!(!controller.animation_step(stale_generation, ms(t0, 200)));
        assert_eq!(controller.offset(), frozen);
    }

    #[test]
    fn test_jump_to_cancels_animation_deterministically() {
        let (mut controller, _wakeups) = controller(10);
        let t0 = Instant::now();

        controller.offset = 3.0;
        controller.start_animation(3.0, MAX_SPEED, t0);
        let stale_generation = controller.generation;

        controller.jump_to(7);
        assert_eq!(controller.offset(), 7.0);
        assert!(!controller.is_animating());

        assert!(!controller.animation_step(stale_generation, ms(t0, 300)));
        assert_eq!(controller.offset(), 7.0);
    }

    #[test]
    fn test_jump_to_out_of_range_clamps() {
        let (mut controller, _wakeups) = controller(5);
        controller.jump_to(99);
        assert_eq!(controller.offset(), 4.0);
    }

    #[test]
    fn test_zero_items_pins_offset() {
        let (mut controller, _wakeups) = controller(0);
        let t0 = Instant::now();

        controller.touch_began(400.0, 300.0, t0);
        controller.touch_moved(100.0, 300.0, ms(t0, 50));
        assert_eq!(controller.offset(), 0.0);
        controller.touch_ended(100.0, 300.0, ms(t0, 100));
        settle(&mut controller, t0);
        assert_eq!(controller.offset(), 0.0);
    }

    #[test]
    fn test_velocity_tracker_windowed_average() {
        let t0 = Instant::now();
        let mut tracker = VelocityTracker::new();
        // 100 px over 100 ms -> 1000 px/sec.
        tracker.add(t0, 0.0);
        tracker.add(ms(t0, 50), 50.0);
        tracker.add(ms(t0, 100), 100.0);
        assert!((tracker.velocity() - 1000.0).abs() < 1.0);

        // Samples older than the window fall out.
        tracker.add(ms(t0, 1200), 100.0);
        let recent = tracker.velocity();
        assert!(recent.abs() < 100.0, "stale samples kept: {}", recent);
    }

    #[test]
    fn test_fast_drag_release_speed_is_clamped() {
        let (mut controller, _wakeups) = controller(100);
        let t0 = Instant::now();

        // A violent fling: 700px in 20ms is far beyond MAX_SPEED once
        // converted; the settle distance must stay within v_max^2 / 2F.
        controller.offset = 50.0;
        controller.touch_began(750.0, 300.0, t0);
        controller.touch_moved(50.0, 300.0, ms(t0, 20));
        controller.touch_ended(50.0, 300.0, ms(t0, 20));
        let animated_from = controller.offset();
        settle(&mut controller, t0);

        let travel = (controller.offset() - animated_from).abs();
        assert!(travel <= 2.0, "clamped max speed travels at most 1.8 -> 2 tiles, got {}", travel);
    }
}
