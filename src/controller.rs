use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::Rng;
use tracing::{debug, info};

use crate::{
    clock::Clock,
    engine::{EngineSettings, TestEngine, TestResult},
    texts::TextSource,
};

/// Which of the two restart controls was used
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RestartControl {
    /// always available (Tab)
    Toolbar,
    /// the button on the results overlay (Enter / r)
    Overlay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything belonging to one test run. Replaced wholesale on restart.
#[derive(Debug)]
pub struct Session {
    engine: TestEngine,
    results: Receiver<TestResult>,
    overlay: Option<TestResult>,
}

impl Session {
    fn new(text: &str, clock: Rc<dyn Clock>, settings: EngineSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        let engine = TestEngine::new(text, clock, settings, move |result| {
            // receiver lives as long as the session, so this only fails during teardown
            let _ = tx.send(result);
        });

        Self {
            engine,
            results: rx,
            overlay: None,
        }
    }

    pub fn engine(&self) -> &TestEngine {
        &self.engine
    }

    /// Final result while the results overlay is visible
    pub fn overlay(&self) -> Option<TestResult> {
        self.overlay
    }

    fn collect_results(&mut self) {
        while let Ok(result) = self.results.try_recv() {
            self.overlay = Some(result);
        }
    }
}

/// Picks texts, owns the current session and maps keys onto it
#[derive(Debug)]
pub struct Controller<R: Rng> {
    texts: TextSource,
    rng: R,
    clock: Rc<dyn Clock>,
    settings: EngineSettings,
    session: Session,
}

impl<R: Rng> Controller<R> {
    pub fn new(
        texts: TextSource,
        mut rng: R,
        clock: Rc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        let session = Self::fresh_session(&texts, &mut rng, &clock, settings);
        Self {
            texts,
            rng,
            clock,
            settings,
            session,
        }
    }

    fn fresh_session(
        texts: &TextSource,
        rng: &mut R,
        clock: &Rc<dyn Clock>,
        settings: EngineSettings,
    ) -> Session {
        let text = texts.pick(rng);
        debug!(chars = text.chars().count(), "selected target text");
        Session::new(text, Rc::clone(clock), settings)
    }

    pub fn initialize(&mut self) {
        self.session = Self::fresh_session(&self.texts, &mut self.rng, &self.clock, self.settings);
    }

    pub fn restart(&mut self, control: RestartControl) {
        info!(%control, state = %self.session.engine.state(), "restarting test");
        self.session.overlay = None;
        self.initialize();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn engine(&self) -> &TestEngine {
        &self.session.engine
    }

    pub fn type_char(&mut self, c: char) {
        if !self.session.engine.input().enabled {
            return;
        }
        let mut value = self.session.engine.input().value.clone();
        value.push(c);
        self.session.engine.on_input(&value);
        self.session.collect_results();
    }

    pub fn backspace(&mut self) {
        let input = self.session.engine.input();
        if !input.enabled || input.value.is_empty() {
            return;
        }
        let mut value = input.value.clone();
        value.pop();
        self.session.engine.on_input(&value);
        self.session.collect_results();
    }

    pub fn on_tick(&mut self) {
        self.session.engine.on_timer();
        self.session.collect_results();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Flow::Quit
            }
            KeyCode::Tab => self.restart(RestartControl::Toolbar),
            _ if self.session.overlay.is_some() => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => self.restart(RestartControl::Overlay),
                _ => {}
            },
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.type_char(c)
            }
            _ => {}
        }

        Flow::Continue
    }
}
