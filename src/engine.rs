use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::clock::Clock;

/// standard "5 characters per word" convention
pub const CHARS_PER_WORD: f64 = 5.0;

pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(1);

/// live wpm stays at 0 until this much time has passed
pub const DEFAULT_LIVE_WPM_MIN: Duration = Duration::from_secs(6);

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// Display classification of a single target character
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Untyped,
    Current,
    Correct,
    Incorrect,
}

/// Values shown in the stats bar
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub wpm: u64,
    pub errors: usize,
    pub seconds: u64,
}

impl Stats {
    pub fn wpm_label(&self) -> String {
        self.wpm.to_string()
    }

    pub fn errors_label(&self) -> String {
        self.errors.to_string()
    }

    pub fn time_label(&self) -> String {
        format!("{}s", self.seconds)
    }
}

/// Emitted once per finished test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestResult {
    pub wpm: u64,
    pub errors: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputField {
    pub value: String,
    pub enabled: bool,
    pub focused: bool,
}

impl InputField {
    fn cleared() -> Self {
        Self {
            value: String::new(),
            enabled: true,
            focused: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub stats_interval: Duration,
    pub live_wpm_min: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stats_interval: DEFAULT_STATS_INTERVAL,
            live_wpm_min: DEFAULT_LIVE_WPM_MIN,
        }
    }
}

/// Periodic timer owned by the engine while a test runs.
/// Dropping it is cancelling it.
#[derive(Debug)]
struct StatsTimer {
    period: Duration,
    next_due: Instant,
}

impl StatsTimer {
    fn arm(now: Instant, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            next_due: now + period,
        }
    }

    /// Returns true at most once per poll when a period boundary has passed
    fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        if self.next_due <= now {
            // missed several periods, skip ahead instead of firing a burst
            self.next_due = now + self.period;
        }
        true
    }
}

pub type FinishHook = Box<dyn FnMut(TestResult)>;

/// Number of positions in the typed prefix that differ from the target
pub fn count_errors(target: &[char], typed: &str) -> usize {
    typed
        .chars()
        .zip(target.iter())
        .filter(|(typed, expected)| typed != *expected)
        .count()
}

pub fn classify(idx: usize, expected: char, typed: &[char], running: bool) -> CharClass {
    if idx == typed.len() && running {
        CharClass::Current
    } else if idx < typed.len() {
        if typed[idx] == expected {
            CharClass::Correct
        } else {
            CharClass::Incorrect
        }
    } else {
        CharClass::Untyped
    }
}

pub fn highlight(target: &[char], typed: &str, running: bool) -> Vec<CharClass> {
    let typed: Vec<char> = typed.chars().collect();
    target
        .iter()
        .enumerate()
        .map(|(idx, expected)| classify(idx, *expected, &typed, running))
        .collect()
}

/// (chars / 5) / minutes. Zero elapsed time yields 0 rather than infinity.
pub fn gross_wpm(chars: usize, elapsed: Duration) -> f64 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0.0;
    }
    (chars as f64 / CHARS_PER_WORD) / minutes
}

fn round_wpm(wpm: f64) -> u64 {
    if wpm.is_finite() && wpm > 0.0 {
        wpm.round() as u64
    } else {
        0
    }
}

/// A single typing test against one target text
pub struct TestEngine {
    target: Vec<char>,
    target_text: String,
    clock: Rc<dyn Clock>,
    settings: EngineSettings,
    state: SessionState,
    started_at: Option<Instant>,
    timer: Option<StatsTimer>,
    typed_count: usize,
    error_count: usize,
    input: InputField,
    stats: Stats,
    display: Vec<CharClass>,
    on_finish: FinishHook,
}

impl TestEngine {
    pub fn new<F>(
        target: &str,
        clock: Rc<dyn Clock>,
        settings: EngineSettings,
        on_finish: F,
    ) -> Self
    where
        F: FnMut(TestResult) + 'static,
    {
        let mut engine = Self {
            target: target.chars().collect(),
            target_text: target.to_string(),
            clock,
            settings,
            state: SessionState::Idle,
            started_at: None,
            timer: None,
            typed_count: 0,
            error_count: 0,
            input: InputField::cleared(),
            stats: Stats::default(),
            display: vec![],
            on_finish: Box::new(on_finish),
        };
        engine.setup_display();
        engine
    }

    fn setup_display(&mut self) {
        self.display = vec![CharClass::Untyped; self.target.len()];
        self.update_highlighting();
    }

    pub fn start(&mut self) {
        if self.state == SessionState::Running {
            return;
        }
        let now = self.clock.now();
        self.state = SessionState::Running;
        self.started_at = Some(now);
        self.timer = Some(StatsTimer::arm(now, self.settings.stats_interval));
        self.input.enabled = true;
        self.input.focused = true;
        debug!(target_len = self.target.len(), "test started");
    }

    pub fn on_input(&mut self, typed: &str) {
        if !self.input.enabled {
            return;
        }
        if self.state == SessionState::Idle {
            self.start();
        }

        let typed_len = typed.chars().count();
        self.typed_count = typed_len;

        if typed_len >= self.target.len() {
            // overshoot past the target is discarded
            self.error_count = count_errors(&self.target, typed);
            self.input.value = self.target_text.clone();
            self.update_highlighting();
            self.finish();
            return;
        }

        self.error_count = count_errors(&self.target, typed);
        self.stats.errors = self.error_count;
        self.input.value = typed.to_string();
        self.update_highlighting();
    }

    pub fn finish(&mut self) -> Option<TestResult> {
        if self.state != SessionState::Running {
            return None;
        }
        self.state = SessionState::Finished;
        self.timer = None;
        self.input.enabled = false;
        self.input.focused = false;

        let elapsed = self.elapsed();
        let result = TestResult {
            wpm: round_wpm(gross_wpm(self.target.len(), elapsed)),
            errors: self.error_count,
        };
        self.stats = Stats {
            wpm: result.wpm,
            errors: result.errors,
            seconds: elapsed.as_secs(),
        };
        self.update_highlighting();

        info!(
            wpm = result.wpm,
            errors = result.errors,
            elapsed_ms = elapsed.as_millis() as u64,
            "test finished"
        );
        (self.on_finish)(result);
        Some(result)
    }

    /// Fires the stats tick if the timer is armed and due
    pub fn on_timer(&mut self) {
        let now = self.clock.now();
        let due = match self.timer.as_mut() {
            Some(timer) => timer.poll(now),
            None => false,
        };
        if due {
            self.tick();
        }
    }

    fn tick(&mut self) {
        let elapsed = self.elapsed();
        let wpm = if elapsed >= self.settings.live_wpm_min {
            round_wpm(gross_wpm(self.typed_count, elapsed))
        } else {
            0
        };
        self.stats = Stats {
            wpm,
            errors: self.error_count,
            seconds: elapsed.as_secs(),
        };
        trace!(wpm, errors = self.error_count, secs = elapsed.as_secs(), "tick");
    }

    pub fn reset(&mut self) {
        self.timer = None;
        self.state = SessionState::Idle;
        self.started_at = None;
        self.error_count = 0;
        self.typed_count = 0;
        self.input = InputField::cleared();
        self.stats = Stats::default();
        self.setup_display();
        debug!("test reset");
    }

    fn update_highlighting(&mut self) {
        let running = self.state == SessionState::Running;
        for (idx, class) in highlight(&self.target, &self.input.value, running)
            .into_iter()
            .enumerate()
        {
            let Some(cell) = self.display.get_mut(idx) else {
                continue;
            };
            *cell = class;
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| self.clock.now().saturating_duration_since(started))
            .unwrap_or_default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn has_started(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn has_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn display(&self) -> &[CharClass] {
        &self.display
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn typed_count(&self) -> usize {
        self.typed_count
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_some()
    }
}

impl fmt::Debug for TestEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEngine")
            .field("target_text", &self.target_text)
            .field("state", &self.state)
            .field("typed_count", &self.typed_count)
            .field("error_count", &self.error_count)
            .field("input", &self.input)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
