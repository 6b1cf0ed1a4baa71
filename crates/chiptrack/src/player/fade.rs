//! Linear fade-out.

/// Unity gain in 16.16 fixed point.
pub const FADE_UNITY: i64 = 1 << 16;

/// Linear fade from unity to silence over `length` frames starting at
/// elapsed frame `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fade {
    start: u64,
    length: u64,
}

impl Fade {
    /// Create a fade.
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// First faded frame.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Frame at which the output reaches silence.
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    /// Gain (16.16) for the frame at elapsed position `frame`.
    #[inline]
    pub fn gain(&self, frame: u64) -> i64 {
        if frame < self.start {
            FADE_UNITY
        } else if frame >= self.end() {
            0
        } else {
            let remaining = (self.end() - frame) as i128;
            (remaining * i128::from(FADE_UNITY) / i128::from(self.length)) as i64
        }
    }

    /// Whether the fade has reached silence at `frame`.
    pub fn is_complete(&self, frame: u64) -> bool {
        frame >= self.end()
    }
}
