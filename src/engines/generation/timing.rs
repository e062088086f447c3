use std::time::Duration;

/// Frames longer than this are treated as stalls and left out of the
/// running time.
pub const MAX_FRAME: Duration = Duration::from_millis(1000);

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Running time of the engine, split into hours, minutes and seconds, plus the generations counted during the last completed second.
#[derive(Debug, Default, Clone)]
pub struct RunningTime {
    carry: Duration,
    total: Duration,
    seconds: u64,
    minutes: u64,
    hours: u64,
    generations_last_second: u64,
}

impl RunningTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one frame. `take_generations` is asked for the generations counted
    /// since the previous rollover each time a full second has elapsed.
    /// Returns whether the frame was counted.
    pub fn add_frame<F>(&mut self, frame: Duration, take_generations: F) -> bool
    where
        F: FnOnce() -> u64,
    {
        if frame > MAX_FRAME {
            return false;
        }

        self.total += frame;
        self.carry += frame;
        if self.carry >= ONE_SECOND {
            self.carry -= ONE_SECOND;
            self.seconds += 1;
            self.generations_last_second = take_generations();
        }
        if self.seconds >= 60 {
            self.seconds -= 60;
            self.minutes += 1;
        }
        if self.minutes >= 60 {
            self.minutes -= 60;
            self.hours += 1;
        }
        true
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn generations_last_second(&self) -> u64 {
        self.generations_last_second
    }

    /// Counted running time at full precision
    pub fn elapsed(&self) -> Duration {
        self.total
    }

    /// Whole seconds of counted running time
    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

/// Ring buffer of the most recent frame durations
#[derive(Debug, Clone)]
pub struct FrameWindow {
    frames: Vec<Duration>,
    capacity: usize,
    cursor: usize,
}

impl FrameWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Record a frame. Returns true when the window has just been filled
    /// end to end again.
    pub fn push(&mut self, frame: Duration) -> bool {
        if self.frames.len() < self.capacity {
            self.frames.push(frame);
        } else {
            self.frames[self.cursor] = frame;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
        self.cursor == 0
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Mean seconds per frame over the window, `0.0` when empty
    pub fn average_seconds(&self) -> f64 {
        if self.frames.is_empty() {
            return 0.0;
        }
        let total: f64 = self.frames.iter().map(Duration::as_secs_f64).sum();
        total / self.frames.len() as f64
    }
}

/// Tracks how fast the overall best fitness climbs.
#[derive(Debug, Default, Clone)]
pub struct FitnessRate {
    total_gain: f64,
    previous_best: Option<f64>,
}

impl FitnessRate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, best: f64) {
        if let Some(previous) = self.previous_best {
            if best.is_finite() && best > previous {
                self.total_gain += best - previous;
            }
        }
        if best.is_finite() {
            self.previous_best = Some(best);
        }
    }

    pub fn total_gain(&self) -> f64 {
        self.total_gain
    }

    pub fn per_second(&self, elapsed_seconds: u64) -> f64 {
        if elapsed_seconds == 0 {
            return 0.0;
        }
        self.total_gain / elapsed_seconds as f64
    }
}
