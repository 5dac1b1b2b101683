//! Landmark sources — where [`HandFrame`]s come from.
//!
//! The editor consumes frames over an `mpsc` channel and does not care
//! whether they were synthesised from the mouse, read from an external
//! detector's JSON stream, or polled from LeapMotion hardware.  When a source
//! returns, its sender drops and the editor loop ends.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::hand::{Hand, HandFrame, Landmark, LANDMARK_COUNT, THUMB_TIP, WRIST};

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`HandFrame`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandFrame>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<HandFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic hands
// ════════════════════════════════════════════════════════════════════════════

/// Single-hand shapes the simulator can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
    Open,
    Pinch,
    Fist,
}

/// Build a plausible 21-point hand whose index fingertip sits at `(x, y)`.
///
/// Fingers fan out to the right of the index; the wrist hangs below.  An
/// extended finger has its tip above its PIP joint, a curled one below.
pub fn synthesize_hand(pose: HandPose, x: f32, y: f32) -> Hand {
    const SPREAD: f32 = 0.025;

    let extended = match pose {
        HandPose::Open  => [true, true, true, true],
        HandPose::Pinch => [true, false, false, false],
        HandPose::Fist  => [false, false, false, false],
    };

    let mut lm = [Landmark::new(x, y); LANDMARK_COUNT];
    lm[WRIST] = Landmark::new(x + 0.04, y + 0.18);

    // thumb: cmc, mcp, ip, tip
    lm[1] = Landmark::new(x - 0.02, y + 0.15);
    lm[2] = Landmark::new(x - 0.05, y + 0.12);
    lm[3] = Landmark::new(x - 0.07, y + 0.10);
    lm[THUMB_TIP] = match pose {
        HandPose::Pinch => Landmark::new(x + 0.01, y + 0.01),
        _               => Landmark::new(x - 0.08, y + 0.08),
    };

    for (f, &up) in extended.iter().enumerate() {
        let fx = x + SPREAD * f as f32;
        let base = 5 + 4 * f;
        // mcp, pip, dip, tip; the tip stays on the finger's own row
        let offsets: [f32; 4] = if up {
            [0.09, 0.06, 0.03, 0.0]
        } else {
            [0.03, -0.02, -0.01, 0.0]
        };
        for (j, dy) in offsets.iter().enumerate() {
            lm[base + j] = Landmark::new(fx, y + dy);
        }
    }

    Hand::new(lm)
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — mouse/keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// What the simulator should show this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPose {
    Single(HandPose),
    /// Two open hands, no pinch. Arms the editor lock.
    TwoOpen,
    /// Nothing in view.
    Hidden,
}

/// Raw per-frame sample from the overlay window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimInput {
    /// Pointer in normalised coordinates, `None` when outside the window.
    pub pointer: Option<(f32, f32)>,
    pub pose:    SimPose,
}

/// The frame a simulator sample stands for.
pub fn synthesize_frame(input: SimInput) -> HandFrame {
    let Some((x, y)) = input.pointer else { return HandFrame::empty() };
    let hands = match input.pose {
        SimPose::Hidden       => Vec::new(),
        SimPose::Single(pose) => vec![synthesize_hand(pose, x, y)],
        SimPose::TwoOpen      => {
            let mirror = if (x - 0.5).abs() < 0.1 { x + 0.3 } else { 1.0 - x };
            vec![
                synthesize_hand(HandPose::Open, x, y),
                synthesize_hand(HandPose::Open, mirror, y),
            ]
        }
    };
    HandFrame { hands }
}

/// Landmark source driven by [`SimInput`] samples from the overlay window.
pub struct SimLandmarkSource {
    pub rx: Receiver<SimInput>,
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        for input in self.rx {
            if tx.send(synthesize_frame(input)).is_err() { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StreamLandmarkSource — JSON lines from an external detector
// ════════════════════════════════════════════════════════════════════════════

/// Reads one JSON object per line:
///
/// ```text
/// {"hands": [[[x, y], [x, y], ... 21 points], ...]}
/// ```
///
/// Malformed lines are logged and skipped; end of input ends the source.
pub struct StreamLandmarkSource {
    reader:   Box<dyn BufRead + Send>,
    label:    String,
    interval: Option<Duration>,
}

impl StreamLandmarkSource {
    pub fn from_reader(reader: impl BufRead + Send + 'static, label: impl Into<String>) -> Self {
        StreamLandmarkSource { reader: Box::new(reader), label: label.into(), interval: None }
    }

    /// Open `path`, or standard input when `path` is `-`.
    pub fn open(path: &Path) -> io::Result<Self> {
        if path.as_os_str() == "-" {
            return Ok(Self::from_reader(BufReader::new(io::stdin()), "stdin"));
        }
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file), path.display().to_string()))
    }

    /// Sleep between frames, for replaying recordings at camera rate.
    pub fn paced(mut self, interval: Duration) -> Self {
        self.interval = Some(interval).filter(|d| !d.is_zero());
        self
    }
}

impl LandmarkSource for StreamLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        let StreamLandmarkSource { reader, label, interval } = *self;
        log::info!("reading landmarks from {}", label);

        for (n, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => {
                    log::error!("landmark input {} failed: {}", label, e);
                    return;
                }
            };
            if line.trim().is_empty() { continue; }

            match serde_json::from_str::<HandFrame>(&line) {
                Ok(frame) => {
                    if tx.send(frame).is_err() { return; }
                    if let Some(d) = interval { thread::sleep(d); }
                }
                Err(e) => log::warn!("{}:{}: skipping landmark line: {}", label, n + 1, e),
            }
        }
        log::info!("landmark input {} ended", label);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Each tracked hand's digit joints are projected onto the 21-point layout:
/// the palm stands in for the wrist, and for every digit the metacarpal
/// end, proximal end, distal start and fingertip fill the four slots.
/// Millimetre positions are mapped into the normalised frame through a fixed
/// interaction box (x ±200 mm, height 100–400 mm).
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        use leaprs::*;

        const X_HALF_MM:  f32 = 200.0;
        const Y_LOW_MM:   f32 = 100.0;
        const Y_RANGE_MM: f32 = 300.0;

        let project = |x: f32, y: f32| Landmark::new(
            (x + X_HALF_MM) / (2.0 * X_HALF_MM),
            1.0 - (y - Y_LOW_MM) / Y_RANGE_MM,
        );

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => { log::error!("LeapC connection failed: {:?}", e); return; }
        };
        if let Err(e) = connection.open() {
            log::error!("LeapMotion device failed to open: {:?}", e);
            return;
        }

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands = frame.hands().map(|hand| {
                    let mut lm = [Landmark::default(); LANDMARK_COUNT];
                    let palm = hand.palm().position();
                    lm[WRIST] = project(palm.x, palm.y);
                    for (d, digit) in hand.digits().enumerate().take(5) {
                        let base = 1 + 4 * d;
                        let joints = [
                            digit.metacarpal().next_joint(),
                            digit.proximal().next_joint(),
                            digit.distal().prev_joint(),
                            digit.distal().next_joint(),
                        ];
                        for (j, p) in joints.iter().enumerate() {
                            lm[base + j] = project(p.x, p.y);
                        }
                    }
                    Hand::new(lm)
                }).collect();

                if tx.send(HandFrame { hands }).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
