//! Two-phase rotary encoder decoding.
//!
//! The decoder counts one step whenever a phase becomes active while the other
//! phase is inactive: phase A leading counts up, phase B leading counts down.
//! This is a minimal two-bit decode, not a full Gray-code state table, so
//! depending on the encoder a physical detent may register as one or two steps.
//!
//! Phase edges arrive from interrupt context while the poll loop reads the
//! position. [`SharedEncoder`] wraps the decoder in a critical-section mutex so
//! the multi-field update and the poll-side snapshot never interleave.

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

/// Inclusive position bounds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EncoderRange {
    min: i16,
    max: i16,
}

/// Reason an [`EncoderRange`] could not be built.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RangeError {
    Inverted { min: i16, max: i16 },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Inverted { min, max } => {
                write!(f, "encoder range inverted (min {min} > max {max})")
            }
        }
    }
}

impl EncoderRange {
    pub const fn new(min: i16, max: i16) -> Result<Self, RangeError> {
        if min > max {
            Err(RangeError::Inverted { min, max })
        } else {
            Ok(Self { min, max })
        }
    }

    pub const fn min(&self) -> i16 {
        self.min
    }

    pub const fn max(&self) -> i16 {
        self.max
    }

    pub const fn contains(&self, position: i16) -> bool {
        position >= self.min && position <= self.max
    }
}

/// Range of the menu encoder: one position per dashboard page.
pub const MENU_ENCODER_RANGE: EncoderRange = match EncoderRange::new(0, 2) {
    Ok(range) => range,
    Err(_) => panic!("menu encoder range"),
};

/// What happens when a step would leave the range.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BoundsPolicy {
    /// Saturate at the bound.
    Clamp,
    /// Jump to the opposite bound.
    Wrap,
}

/// Decoder state updated from the phase edge handlers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct QuadratureDecoder {
    phase_a: bool,
    phase_b: bool,
    position: i16,
    range: EncoderRange,
    policy: BoundsPolicy,
    rotating_left: bool,
    rotating_right: bool,
}

impl QuadratureDecoder {
    /// Creates a decoder resting at the bottom of `range` with both phases low.
    pub const fn new(range: EncoderRange, policy: BoundsPolicy) -> Self {
        Self {
            phase_a: false,
            phase_b: false,
            position: range.min,
            range,
            policy,
            rotating_left: false,
            rotating_right: false,
        }
    }

    pub const fn position(&self) -> i16 {
        self.position
    }

    pub const fn range(&self) -> EncoderRange {
        self.range
    }

    pub const fn policy(&self) -> BoundsPolicy {
        self.policy
    }

    pub const fn is_rotating_left(&self) -> bool {
        self.rotating_left
    }

    pub const fn is_rotating_right(&self) -> bool {
        self.rotating_right
    }

    /// Handles a level change reported on phase A.
    pub fn on_phase_a_changed(&mut self, level: bool) {
        if level != self.phase_a {
            self.phase_a = level;
            if self.phase_a && !self.phase_b {
                self.step(1);
                self.rotating_left = false;
                self.rotating_right = true;
            }
        }
        self.apply_bounds();
    }

    /// Handles a level change reported on phase B.
    pub fn on_phase_b_changed(&mut self, level: bool) {
        if level != self.phase_b {
            self.phase_b = level;
            if self.phase_b && !self.phase_a {
                self.step(-1);
                self.rotating_right = false;
                self.rotating_left = true;
            }
        }
        self.apply_bounds();
    }

    pub fn reset_rotating(&mut self) {
        self.rotating_left = false;
        self.rotating_right = false;
    }

    pub fn reset_position(&mut self) {
        self.position = self.range.min;
    }

    /// Moves to `position`, subject to the bounds policy.
    pub fn set_position(&mut self, position: i16) {
        self.position = position;
        self.apply_bounds();
    }

    /// Replaces the bounds and immediately brings the position back inside them.
    pub fn set_range(&mut self, range: EncoderRange) {
        self.range = range;
        self.apply_bounds();
    }

    /// Moves one detent. Overflowing `i16` counts as leaving the range.
    fn step(&mut self, delta: i16) {
        let EncoderRange { min, max } = self.range;
        self.position = match (self.position.checked_add(delta), self.policy) {
            (Some(position), _) => position,
            (None, BoundsPolicy::Wrap) if delta > 0 => min,
            (None, BoundsPolicy::Wrap) => max,
            (None, BoundsPolicy::Clamp) if delta > 0 => max,
            (None, BoundsPolicy::Clamp) => min,
        };
    }

    fn apply_bounds(&mut self) {
        let EncoderRange { min, max } = self.range;
        match self.policy {
            BoundsPolicy::Wrap => {
                if self.position > max {
                    self.position = min;
                }
                if self.position < min {
                    self.position = max;
                }
            }
            BoundsPolicy::Clamp => {
                self.position = self.position.clamp(min, max);
            }
        }
    }

    pub const fn snapshot(&self) -> EncoderSnapshot {
        EncoderSnapshot {
            position: self.position,
            rotating_left: self.rotating_left,
            rotating_right: self.rotating_right,
        }
    }
}

/// Consistent view of the decoder taken in one critical section.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EncoderSnapshot {
    pub position: i16,
    pub rotating_left: bool,
    pub rotating_right: bool,
}

/// Decoder shared between the phase edge handlers and the poll loop.
pub struct SharedEncoder {
    inner: Mutex<Cell<QuadratureDecoder>>,
}

impl SharedEncoder {
    pub const fn new(decoder: QuadratureDecoder) -> Self {
        Self {
            inner: Mutex::new(Cell::new(decoder)),
        }
    }

    /// Phase A edge handler.
    pub fn on_phase_a_changed(&self, level: bool) {
        self.update(|decoder| decoder.on_phase_a_changed(level));
    }

    /// Phase B edge handler.
    pub fn on_phase_b_changed(&self, level: bool) {
        self.update(|decoder| decoder.on_phase_b_changed(level));
    }

    pub fn snapshot(&self) -> EncoderSnapshot {
        critical_section::with(|cs| self.inner.borrow(cs).get().snapshot())
    }

    pub fn position(&self) -> i16 {
        self.snapshot().position
    }

    pub fn reset_rotating(&self) {
        self.update(QuadratureDecoder::reset_rotating);
    }

    pub fn reset_position(&self) {
        self.update(QuadratureDecoder::reset_position);
    }

    pub fn set_range(&self, range: EncoderRange) {
        self.update(|decoder| decoder.set_range(range));
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut QuadratureDecoder),
    {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut decoder = cell.get();
            apply(&mut decoder);
            cell.set(decoder);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: i16, max: i16) -> EncoderRange {
        EncoderRange::new(min, max).unwrap()
    }

    /// One detent clockwise: A leads B.
    fn step_right(decoder: &mut QuadratureDecoder) {
        decoder.on_phase_a_changed(true);
        decoder.on_phase_b_changed(true);
        decoder.on_phase_a_changed(false);
        decoder.on_phase_b_changed(false);
    }

    /// One detent counter-clockwise: B leads A.
    fn step_left(decoder: &mut QuadratureDecoder) {
        decoder.on_phase_b_changed(true);
        decoder.on_phase_a_changed(true);
        decoder.on_phase_b_changed(false);
        decoder.on_phase_a_changed(false);
    }

    #[test]
    fn phase_a_leading_counts_up_and_flags_right() {
        let mut decoder = QuadratureDecoder::new(range(0, 10), BoundsPolicy::Clamp);
        decoder.on_phase_a_changed(true);
        assert_eq!(decoder.position(), 1);
        assert!(decoder.is_rotating_right());
        assert!(!decoder.is_rotating_left());

        // B following A does not count.
        decoder.on_phase_b_changed(true);
        assert_eq!(decoder.position(), 1);
    }

    #[test]
    fn phase_b_leading_counts_down_and_flags_left() {
        let mut decoder = QuadratureDecoder::new(range(0, 10), BoundsPolicy::Clamp);
        decoder.set_position(5);
        decoder.on_phase_b_changed(true);
        assert_eq!(decoder.position(), 4);
        assert!(decoder.is_rotating_left());
        assert!(!decoder.is_rotating_right());
    }

    #[test]
    fn repeated_level_reports_are_ignored() {
        let mut decoder = QuadratureDecoder::new(range(0, 10), BoundsPolicy::Clamp);
        decoder.on_phase_a_changed(true);
        decoder.on_phase_a_changed(true);
        decoder.on_phase_a_changed(true);
        assert_eq!(decoder.position(), 1);
    }

    #[test]
    fn wrap_policy_jumps_to_opposite_bound() {
        let mut decoder = QuadratureDecoder::new(range(0, 2), BoundsPolicy::Wrap);
        for expected in [1, 2, 0, 1] {
            step_right(&mut decoder);
            assert_eq!(decoder.position(), expected);
        }
        decoder.reset_position();
        step_left(&mut decoder);
        assert_eq!(decoder.position(), 2);
    }

    #[test]
    fn wrap_policy_wraps_at_integer_limits() {
        let mut decoder = QuadratureDecoder::new(range(0, i16::MAX), BoundsPolicy::Wrap);
        decoder.set_position(i16::MAX);
        decoder.on_phase_a_changed(true);
        assert_eq!(decoder.position(), 0);

        let mut decoder = QuadratureDecoder::new(range(i16::MIN, 5), BoundsPolicy::Wrap);
        assert_eq!(decoder.position(), i16::MIN);
        decoder.on_phase_b_changed(true);
        assert_eq!(decoder.position(), 5);
    }

    #[test]
    fn clamp_policy_holds_at_integer_limits() {
        let mut decoder = QuadratureDecoder::new(range(0, i16::MAX), BoundsPolicy::Clamp);
        decoder.set_position(i16::MAX);
        step_right(&mut decoder);
        assert_eq!(decoder.position(), i16::MAX);

        let mut decoder = QuadratureDecoder::new(range(i16::MIN, 0), BoundsPolicy::Clamp);
        step_left(&mut decoder);
        assert_eq!(decoder.position(), i16::MIN);
    }

    #[test]
    fn clamp_policy_saturates() {
        let mut decoder = QuadratureDecoder::new(range(-2, 2), BoundsPolicy::Clamp);
        assert_eq!(decoder.position(), -2);
        step_left(&mut decoder);
        assert_eq!(decoder.position(), -2);
        for _ in 0..10 {
            step_right(&mut decoder);
        }
        assert_eq!(decoder.position(), 2);
    }

    #[test]
    fn position_stays_in_bounds_for_any_edge_sequence() {
        for policy in [BoundsPolicy::Clamp, BoundsPolicy::Wrap] {
            let mut decoder = QuadratureDecoder::new(range(-3, 4), policy);
            let mut seed: u32 = 0x1234_5678;
            for _ in 0..2_000 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                let level = seed & 1 == 1;
                if seed & 2 == 0 {
                    decoder.on_phase_a_changed(level);
                } else {
                    decoder.on_phase_b_changed(level);
                }
                assert!(decoder.range().contains(decoder.position()), "{policy:?}");
            }
        }
    }

    #[test]
    fn set_range_reapplies_policy() {
        let mut clamped = QuadratureDecoder::new(range(0, 10), BoundsPolicy::Clamp);
        clamped.set_position(9);
        clamped.set_range(range(0, 5));
        assert_eq!(clamped.position(), 5);

        let mut wrapped = QuadratureDecoder::new(range(0, 10), BoundsPolicy::Wrap);
        wrapped.set_position(9);
        wrapped.set_range(range(0, 5));
        assert_eq!(wrapped.position(), 0);
    }

    #[test]
    fn reset_rotating_clears_both_flags() {
        let mut decoder = QuadratureDecoder::new(range(0, 10), BoundsPolicy::Clamp);
        step_right(&mut decoder);
        decoder.reset_rotating();
        assert!(!decoder.is_rotating_left());
        assert!(!decoder.is_rotating_right());
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            EncoderRange::new(3, 1),
            Err(RangeError::Inverted { min: 3, max: 1 })
        );
    }

    #[test]
    fn shared_encoder_snapshot_tracks_handlers() {
        static ENCODER: SharedEncoder =
            SharedEncoder::new(QuadratureDecoder::new(MENU_ENCODER_RANGE, BoundsPolicy::Wrap));

        ENCODER.on_phase_a_changed(true);
        let snapshot = ENCODER.snapshot();
        assert_eq!(snapshot.position, 1);
        assert!(snapshot.rotating_right);

        ENCODER.on_phase_a_changed(false);
        ENCODER.on_phase_b_changed(true);
        let snapshot = ENCODER.snapshot();
        assert_eq!(snapshot.position, 0);
        assert!(snapshot.rotating_left);

        ENCODER.reset_rotating();
        assert!(!ENCODER.snapshot().rotating_left);
        ENCODER.set_range(EncoderRange::new(5, 6).unwrap());
        assert_eq!(ENCODER.position(), 6);
        ENCODER.reset_position();
        assert_eq!(ENCODER.position(), 5);
    }
}
