//! Gesture classification and hold-to-confirm timing.
//!
//! Classification is stateless: every test looks at a single frame's
//! landmarks.  Anything that needs time (confirming a pinch, arming a move,
//! locking the editor) goes through a [`HoldGate`].

use std::time::{Duration, Instant};

use crate::hand::{
    Hand, HandFrame, Landmark, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP,
    PINKY_TIP, RING_PIP, RING_TIP, THUMB_TIP,
};

/// Thumb tip ↔ index tip distance (normalised) below which a hand pinches.
pub const PINCH_THRESHOLD: f32 = 0.05;

/// (tip, pip) pairs for index, middle, ring and pinky.
pub const FINGERS: [(usize, usize); 4] = [
    (INDEX_TIP,  INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP,   RING_PIP),
    (PINKY_TIP,  PINKY_PIP),
];

// ════════════════════════════════════════════════════════════════════════════
// Single-hand tests
// ════════════════════════════════════════════════════════════════════════════

/// A finger is extended when its tip sits above its PIP joint in image space.
pub fn finger_extended(hand: &Hand, tip: usize, pip: usize) -> bool {
    hand.point(tip).y < hand.point(pip).y
}

/// No finger extended.
pub fn is_fist(hand: &Hand) -> bool {
    FINGERS.iter().all(|&(tip, pip)| !finger_extended(hand, tip, pip))
}

/// All four fingers extended.
pub fn is_open(hand: &Hand) -> bool {
    FINGERS.iter().all(|&(tip, pip)| finger_extended(hand, tip, pip))
}

pub fn is_pinch(hand: &Hand, threshold: f32) -> bool {
    hand.point(THUMB_TIP).distance(hand.point(INDEX_TIP)) < threshold
}

/// Everything the editor asks of the primary hand in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandSignals {
    pub pinch: bool,
    pub fist:  bool,
    pub open:  bool,
    /// Index fingertip; `None` when no hand is present.
    pub tip:   Option<Landmark>,
}

impl HandSignals {
    pub fn classify(hand: &Hand, pinch_threshold: f32) -> Self {
        HandSignals {
            pinch: is_pinch(hand, pinch_threshold),
            fist:  is_fist(hand),
            open:  is_open(hand),
            tip:   Some(hand.index_tip()),
        }
    }

    /// Signals for the primary hand, all false when the frame is empty.
    pub fn primary(frame: &HandFrame, pinch_threshold: f32) -> Self {
        frame.primary()
            .map(|h| HandSignals::classify(h, pinch_threshold))
            .unwrap_or_default()
    }
}

/// Whole-frame counts used by the two-hand lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSignals {
    pub hands:      usize,
    pub open_hands: usize,
    pub any_pinch:  bool,
}

impl FrameSignals {
    pub fn classify(frame: &HandFrame, pinch_threshold: f32) -> Self {
        FrameSignals {
            hands:      frame.hands.len(),
            open_hands: frame.hands.iter().filter(|h| is_open(h)).count(),
            any_pinch:  frame.hands.iter().any(|h| is_pinch(h, pinch_threshold)),
        }
    }

    /// Two open hands and nobody pinching.
    pub fn two_hand_ready(&self) -> bool {
        self.open_hands == 2 && !self.any_pinch
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HoldGate
// ════════════════════════════════════════════════════════════════════════════

/// State of a [`HoldGate`] after one update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hold {
    /// Predicate not held.
    Idle,
    /// Held for less than the duration; `progress` in `0.0..1.0`.
    Charging { progress: f32 },
    /// The duration has just elapsed.  Reported once per engagement.
    Confirmed,
    /// Still held after confirming.
    Held,
}

impl Hold {
    /// Ring fill for the on-screen indicator, if one should be drawn.
    pub fn indicator(self) -> Option<f32> {
        match self {
            Hold::Charging { progress } => Some(progress),
            Hold::Confirmed             => Some(1.0),
            Hold::Idle | Hold::Held     => None,
        }
    }

    pub fn is_confirmed(self) -> bool { self == Hold::Confirmed }
}

/// Fires once after a predicate has been continuously true for `duration`.
#[derive(Clone, Debug)]
pub struct HoldGate {
    duration: Duration,
    started:  Option<Instant>,
    fired:    bool,
}

impl HoldGate {
    pub fn new(duration: Duration) -> Self {
        HoldGate { duration, started: None, fired: false }
    }

    pub fn update(&mut self, engaged: bool, now: Instant) -> Hold {
        if !engaged {
            self.reset();
            return Hold::Idle;
        }
        let started = *self.started.get_or_insert(now);
        if self.fired {
            return Hold::Held;
        }

        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(started).as_secs_f32()
                / self.duration.as_secs_f32()).min(1.0)
        };
        if progress >= 1.0 {
            self.fired = true;
            Hold::Confirmed
        } else {
            Hold::Charging { progress }
        }
    }

    pub fn reset(&mut self) {
        self.started = None;
        self.fired = false;
    }

    pub fn is_engaged(&self) -> bool { self.started.is_some() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{synthesize_hand, HandPose};

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn open_hand_classifies_open() {
        let hand = synthesize_hand(HandPose::Open, 0.5, 0.5);
        let s = HandSignals::classify(&hand, PINCH_THRESHOLD);
        assert!(s.open);
        assert!(!s.fist);
        assert!(!s.pinch);
        assert_eq!(s.tip, Some(Landmark::new(0.5, 0.5)));
    }

    #[test]
    fn pinch_classifies_pinch_not_open() {
        let hand = synthesize_hand(HandPose::Pinch, 0.3, 0.4);
        let s = HandSignals::classify(&hand, PINCH_THRESHOLD);
        assert!(s.pinch);
        assert!(!s.open);
        assert!(!s.fist);
    }

    #[test]
    fn fist_has_no_extended_fingers() {
        let hand = synthesize_hand(HandPose::Fist, 0.3, 0.4);
        assert!(is_fist(&hand));
        assert!(!is_open(&hand));
        assert!(!is_pinch(&hand, PINCH_THRESHOLD));
    }

    #[test]
    fn pinch_uses_thumb_to_index_distance() {
        let mut hand = synthesize_hand(HandPose::Open, 0.5, 0.5);
        hand.landmarks[THUMB_TIP] = Landmark::new(0.56, 0.5);
        assert!(!is_pinch(&hand, 0.05));
        hand.landmarks[THUMB_TIP] = Landmark::new(0.54, 0.5);
        assert!(is_pinch(&hand, 0.05));
    }

    #[test]
    fn empty_frame_signals_nothing() {
        let s = HandSignals::primary(&HandFrame::empty(), PINCH_THRESHOLD);
        assert_eq!(s, HandSignals::default());
        assert!(s.tip.is_none());
    }

    #[test]
    fn two_hand_ready_needs_two_open_and_no_pinch() {
        let open = synthesize_hand(HandPose::Open, 0.3, 0.5);
        let pinch = synthesize_hand(HandPose::Pinch, 0.7, 0.5);

        let both_open = HandFrame { hands: vec![open.clone(), open.clone()] };
        assert!(FrameSignals::classify(&both_open, PINCH_THRESHOLD).two_hand_ready());

        let one_pinching = HandFrame { hands: vec![open.clone(), pinch] };
        assert!(!FrameSignals::classify(&one_pinching, PINCH_THRESHOLD).two_hand_ready());

        let single = HandFrame { hands: vec![open] };
        assert!(!FrameSignals::classify(&single, PINCH_THRESHOLD).two_hand_ready());
    }

    #[test]
    fn gate_charges_confirms_once_then_holds() {
        let t0 = Instant::now();
        let mut gate = HoldGate::new(ms(500));

        assert_eq!(gate.update(true, t0), Hold::Charging { progress: 0.0 });
        match gate.update(true, t0 + ms(250)) {
            Hold::Charging { progress } => assert!((progress - 0.5).abs() < 1e-3),
            other => panic!("expected charging, got {:?}", other),
        }
        assert_eq!(gate.update(true, t0 + ms(500)), Hold::Confirmed);
        assert_eq!(gate.update(true, t0 + ms(900)), Hold::Held);
        assert_eq!(gate.update(true, t0 + ms(2000)), Hold::Held);
    }

    #[test]
    fn gate_resets_when_released() {
        let t0 = Instant::now();
        let mut gate = HoldGate::new(ms(500));
        gate.update(true, t0);
        gate.update(true, t0 + ms(400));
        assert_eq!(gate.update(false, t0 + ms(450)), Hold::Idle);
        assert!(!gate.is_engaged());

        // Restarting measures from the new engagement.
        assert_eq!(gate.update(true, t0 + ms(460)), Hold::Charging { progress: 0.0 });
        assert!(!gate.update(true, t0 + ms(900)).is_confirmed());
        assert!(gate.update(true, t0 + ms(960)).is_confirmed());
    }

    #[test]
    fn indicator_only_while_charging_or_confirming() {
        assert_eq!(Hold::Idle.indicator(), None);
        assert_eq!(Hold::Held.indicator(), None);
        assert_eq!(Hold::Confirmed.indicator(), Some(1.0));
        assert_eq!(Hold::Charging { progress: 0.3 }.indicator(), Some(0.3));
    }
}
