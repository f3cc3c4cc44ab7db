use crate::error::{GenerateError, SessionError};
use crate::generator::ProblemGenerator;
use crate::history::ScoreLog;
use crate::input::{ByteSource, InputReader};
use crate::log::LogRecord;
use crate::problem::Problem;
use crate::terminal::TerminalMode;
use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use rand::rngs::ThreadRng;
use rand::Rng;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Messages consumed by the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Current answer text. `epoch` counts the clears the reader has seen.
    Answer { epoch: u64, text: String },
    Quit,
    TimedOut,
    InputFailed(String),
}

/// Messages from the session back to the input reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    TimedOut,
    Quit,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimedOut,
    Quit,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub reason: EndReason,
    pub score: usize,
    /// `None` only if the session never showed a problem.
    pub record: Option<LogRecord>,
}

/// Set-once flag; the first `claim` wins.
#[derive(Debug, Default)]
pub struct OnceFlag(AtomicBool);

impl OnceFlag {
    pub fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sends [`SessionEvent::TimedOut`] once `duration` has elapsed unless it is
/// dropped first.
pub struct SessionTimer {
    _cancel: Sender<()>,
    thread: JoinHandle<()>,
}

impl SessionTimer {
    pub fn start(duration: Duration, events: Sender<SessionEvent>) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let thread = thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(duration) {
                tracing::debug!(?duration, "session timer fired");
                let _ = events.send(SessionEvent::TimedOut);
            }
        });
        Self {
            _cancel: cancel,
            thread,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.thread.is_finished()
    }
}

/// One timed drill: shows problems, checks answers, and writes a single
/// history record when it ends.
pub struct GameSession<'t, W: Write, R: Rng = ThreadRng> {
    generator: ProblemGenerator<R>,
    log: ScoreLog,
    terminal: &'t dyn TerminalMode,
    out: W,
    state: SessionState,
    problems: Vec<Problem>,
    solve_times: Vec<u64>,
    expected: String,
    problem_started: Instant,
    epoch: u64,
    closed: OnceFlag,
}

impl<'t, W: Write, R: Rng> GameSession<'t, W, R> {
    pub fn new(
        generator: ProblemGenerator<R>,
        log: ScoreLog,
        terminal: &'t dyn TerminalMode,
        out: W,
    ) -> Self {
        Self {
            generator,
            log,
            terminal,
            out,
            state: SessionState::Idle,
            problems: Vec::new(),
            solve_times: Vec::new(),
            expected: String::new(),
            problem_started: Instant::now(),
            epoch: 0,
            closed: OnceFlag::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> usize {
        self.solve_times.len()
    }

    /// Runs until the timer fires, the player quits, or input fails. Cleanup
    /// (score, history record, terminal restore) happens on every path.
    pub fn run(
        mut self,
        events: &Receiver<SessionEvent>,
        control: &Sender<Control>,
    ) -> Result<SessionOutcome, SessionError> {
        let played = self.play(events, control);
        let reason = match &played {
            Ok(reason) => *reason,
            Err(e) => {
                tracing::error!(error = %e, "session aborted");
                EndReason::Aborted
            }
        };
        let closed = self.close(reason);
        let reason = played?;
        Ok(SessionOutcome {
            reason,
            score: self.score(),
            record: closed?,
        })
    }

    fn play(
        &mut self,
        events: &Receiver<SessionEvent>,
        control: &Sender<Control>,
    ) -> Result<EndReason, SessionError> {
        self.next_problem()?;

        loop {
            match events.recv().map_err(|_| SessionError::Disconnected)? {
                SessionEvent::Answer { epoch, text } => {
                    if epoch < self.epoch {
                        tracing::trace!(epoch, current = self.epoch, "dropping stale answer");
                        continue;
                    }
                    self.render_answer(&text)?;
                    if text == self.expected {
                        self.solved(control)?;
                    }
                }
                SessionEvent::Quit => {
                    self.state = SessionState::Quit;
                    return Ok(EndReason::Quit);
                }
                SessionEvent::TimedOut => {
                    self.state = SessionState::TimedOut;
                    return Ok(EndReason::TimedOut);
                }
                SessionEvent::InputFailed(message) => return Err(SessionError::Input(message)),
            }
        }
    }

    fn solved(&mut self, control: &Sender<Control>) -> Result<(), SessionError> {
        let elapsed = self.problem_started.elapsed().as_millis() as u64;
        // draw first so a generation failure leaves the solved problem in flight
        let (problem, expected) = self.draw()?;
        self.solve_times.push(elapsed);
        self.epoch += 1;
        if control.send(Control::Clear).is_err() {
            tracing::warn!("input reader is gone; cannot clear the answer");
        }
        self.show(problem, expected)
    }

    fn next_problem(&mut self) -> Result<(), SessionError> {
        let (problem, expected) = self.draw()?;
        self.show(problem, expected)
    }

    fn draw(&mut self) -> Result<(Problem, String), SessionError> {
        let problem = self.generator.generate()?;
        let expected = problem
            .answer_text()
            .ok_or_else(|| GenerateError::Overflow(problem.to_string()))?;
        Ok((problem, expected))
    }

    fn show(&mut self, problem: Problem, expected: String) -> Result<(), SessionError> {
        self.problems.push(problem);
        self.expected = expected;
        self.problem_started = Instant::now();
        self.state = SessionState::Running;

        let separator = if self.problems.len() == 1 { "" } else { "\r\n" };
        queue!(self.out, Print(format!("{separator}{problem}: ")))?;
        self.out.flush()?;
        Ok(())
    }

    fn render_answer(&mut self, text: &str) -> Result<(), SessionError> {
        if let Some(problem) = self.problems.last() {
            queue!(
                self.out,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(format!("{problem}: {text}"))
            )?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Prints the score, appends the history record, and restores the
    /// terminal. Only the first call does anything.
    fn close(&mut self, reason: EndReason) -> Result<Option<LogRecord>, SessionError> {
        if !self.closed.claim() {
            return Ok(None);
        }

        let printed = write!(self.out, "\r\nScore: {}\r\n", self.score())
            .and_then(|_| self.out.flush());

        let record = LogRecord::from_session(
            &self.problems,
            &self.solve_times,
            self.generator.config().duration_secs,
        );
        let logged = match &record {
            Some(record) => self.log.append(record),
            None => {
                tracing::warn!(
                    problems = self.problems.len(),
                    solved = self.solve_times.len(),
                    "nothing to record"
                );
                Ok(())
            }
        };

        let restored = self.terminal.restore();
        self.state = SessionState::Closed;
        tracing::info!(?reason, score = self.score(), "session closed");

        printed?;
        logged?;
        restored?;
        Ok(record)
    }
}

/// Wires a session to a reader thread over `source` and a timer for the
/// configured duration, then runs it to completion.
pub fn run_session<S, W, R>(
    generator: ProblemGenerator<R>,
    log: ScoreLog,
    terminal: &dyn TerminalMode,
    source: S,
    mut out: W,
) -> Result<SessionOutcome, SessionError>
where
    S: ByteSource,
    W: Write,
    R: Rng,
{
    let secs = generator.config().duration_secs;
    write!(out, "Duration: {secs}s\r\n")?;

    let (event_tx, event_rx) = mpsc::channel();
    let (control_tx, control_rx) = mpsc::channel();
    let reader = InputReader::new(source, event_tx.clone(), control_rx).spawn();
    let duration = Duration::from_secs(u64::try_from(secs).unwrap_or(0));
    let timer = SessionTimer::start(duration, event_tx);

    let outcome = GameSession::new(generator, log, terminal, out).run(&event_rx, &control_tx);

    drop(timer);
    reader.stop();
    outcome
}
