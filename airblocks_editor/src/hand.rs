//! Hand landmarks as delivered by an external detector.
//!
//! Coordinates are normalised to the camera frame: `x` grows to the right,
//! `y` grows downward, both nominally in `0.0..=1.0`.  The 21-point layout is
//! the usual one (wrist, then four joints per digit, thumb first).

use serde::{Deserialize, Serialize};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP:   usize = 14;
pub const RING_TIP:   usize = 16;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_TIP:  usize = 20;

/// Skeleton edges for drawing.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
    (0, 17),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One normalised point.  On the wire: `[x, y]` (a trailing depth value, as
/// some detectors emit, is accepted and ignored).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "[f32; 2]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self { Landmark { x, y } }

    pub fn distance(self, other: Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Pixel position on a `w × h` canvas (truncating toward zero).
    pub fn to_pixel(self, w: usize, h: usize) -> (i32, i32) {
        ((self.x * w as f32) as i32, (self.y * h as f32) as i32)
    }
}

impl TryFrom<Vec<f32>> for Landmark {
    type Error = String;

    fn try_from(v: Vec<f32>) -> Result<Self, Self::Error> {
        match v.as_slice() {
            [x, y] | [x, y, _] => Ok(Landmark::new(*x, *y)),
            other => Err(format!("landmark needs 2 or 3 numbers, got {}", other.len())),
        }
    }
}

impl From<Landmark> for [f32; 2] {
    fn from(l: Landmark) -> Self { [l.x, l.y] }
}

// ════════════════════════════════════════════════════════════════════════════
// Hand / HandFrame
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct Hand {
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl Hand {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self { Hand { landmarks } }

    pub fn point(&self, index: usize) -> Landmark { self.landmarks[index] }

    /// The cursor point.
    pub fn index_tip(&self) -> Landmark { self.landmarks[INDEX_TIP] }
}

impl TryFrom<Vec<Landmark>> for Hand {
    type Error = String;

    fn try_from(v: Vec<Landmark>) -> Result<Self, Self::Error> {
        let n = v.len();
        <[Landmark; LANDMARK_COUNT]>::try_from(v)
            .map(Hand::new)
            .map_err(|_| format!("hand needs {} landmarks, got {}", LANDMARK_COUNT, n))
    }
}

impl From<Hand> for Vec<Landmark> {
    fn from(h: Hand) -> Self { h.landmarks.to_vec() }
}

/// Everything the detector saw in one camera frame.  The first hand is the
/// primary (cursor) hand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    #[serde(default)]
    pub hands: Vec<Hand>,
}

impl HandFrame {
    pub fn empty() -> Self { HandFrame::default() }

    pub fn primary(&self) -> Option<&Hand> { self.hands.first() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> String {
        let pts: Vec<String> = (0..n).map(|i| format!("[{}, 0.5]", i as f32 / 100.0)).collect();
        format!("[{}]", pts.join(", "))
    }

    #[test]
    fn frame_parses_from_json_line() {
        let json = format!(r#"{{"hands": [{}, {}]}}"#, line(21), line(21));
        let frame: HandFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame.hands.len(), 2);
        assert_eq!(frame.primary().unwrap().index_tip(), Landmark::new(0.08, 0.5));
    }

    #[test]
    fn missing_hands_key_is_empty_frame() {
        let frame: HandFrame = serde_json::from_str("{}").unwrap();
        assert!(frame.primary().is_none());
    }

    #[test]
    fn wrong_landmark_count_is_rejected() {
        let json = format!(r#"{{"hands": [{}]}}"#, line(20));
        assert!(serde_json::from_str::<HandFrame>(&json).is_err());
    }

    #[test]
    fn depth_component_is_ignored() {
        let l: Landmark = serde_json::from_str("[0.25, 0.75, -0.1]").unwrap();
        assert_eq!(l, Landmark::new(0.25, 0.75));
        assert!(serde_json::from_str::<Landmark>("[0.25]").is_err());
    }

    #[test]
    fn pixel_mapping_truncates() {
        assert_eq!(Landmark::new(0.5, 0.25).to_pixel(1280, 720), (640, 180));
        assert_eq!(Landmark::new(0.0999, 0.0).to_pixel(100, 100), (9, 0));
    }
}
