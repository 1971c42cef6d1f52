//! Shows the survey page in a terminal.

mod draw;
mod input;

use crate::{
    background::{Color, Raster, Viewport},
    page::{Event, Page},
};
use crossterm::{
    cursor,
    event::{self as terminal_event, KeyEvent},
    execute,
    style::ResetColor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use draw::{View, compose};
use input::{Action, Cursor};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

/// Viewport units covered by a terminal column.
pub(crate) const UNITS_PER_COLUMN: f32 = 8.0;

/// Viewport units covered by a terminal row.
pub(crate) const UNITS_PER_ROW: f32 = 16.0;

/// The size of a background pixel in viewport units: each cell shows two stacked pixels.
pub(crate) const PIXEL_SIZE: f32 = 8.0;

pub(crate) fn viewport_for(columns: u16, rows: u16) -> Viewport {
    Viewport { width: columns as f32 * UNITS_PER_COLUMN, height: rows as f32 * UNITS_PER_ROW }
}

/// Holds the terminal in raw mode on the alternate screen, restoring it when dropped.
pub(crate) struct TerminalGuard {
    stdout: Stdout,
}

impl TerminalGuard {
    pub(crate) fn enter() -> Result<Self, TerminalError> {
        terminal::enable_raw_mode().map_err(TerminalError::Setup)?;
        let mut guard = Self { stdout: io::stdout() };
        execute!(guard.stdout, EnterAlternateScreen, cursor::Hide).map_err(TerminalError::Setup)?;
        Ok(guard)
    }

    /// Restore the terminal to the state it was in before entering raw mode.
    pub(crate) fn restore() {
        let _ = execute!(io::stdout(), ResetColor, cursor::Show, LeaveAlternateScreen);
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("failed to disable raw mode: {e}");
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        Self::restore();
    }
}

/// Runs the page until the user quits.
pub(crate) struct TerminalApp {
    page: Page<Raster>,
    frame_interval: Duration,
    backdrop: Color,
    cursor: Cursor,
    size: (u16, u16),
}

impl TerminalApp {
    pub(crate) fn new(page: Page<Raster>, frame_interval: Duration, backdrop: Color) -> Self {
        Self { page, frame_interval, backdrop, cursor: Cursor::default(), size: (0, 0) }
    }

    /// Take over the terminal and run until the user quits. Returns the page afterwards.
    pub(crate) fn run(mut self) -> Result<Page<Raster>, TerminalError> {
        let mut guard = TerminalGuard::enter()?;
        self.size = terminal::size()?;
        let (columns, rows) = self.size;
        self.page.dispatch(Event::PageReady(viewport_for(columns, rows)));
        let petals = self.page.animation().map_or(0, |animation| animation.petals().len());
        tracing::info!(columns, rows, petals, "survey page ready");

        let mut next_frame = Instant::now();
        loop {
            if let Some(event) = self.page.poll_submission() {
                self.page.dispatch(event);
                self.sync_cursor();
            }
            let now = Instant::now();
            if now >= next_frame {
                self.page.dispatch(Event::FrameTick);
                self.draw(&mut guard.stdout)?;
                next_frame = now + self.frame_interval;
            }

            let timeout = next_frame.saturating_duration_since(Instant::now());
            if !terminal_event::poll(timeout)? {
                continue;
            }
            match terminal_event::read()? {
                terminal_event::Event::Key(key) => {
                    if let Some(Action::Quit) = self.handle_key(key) {
                        break;
                    }
                }
                terminal_event::Event::Resize(columns, rows) => {
                    self.size = (columns, rows);
                    self.page.dispatch(Event::Resize(viewport_for(columns, rows)));
                }
                _ => (),
            }
        }
        if self.page.is_submitting() {
            tracing::warn!("exiting while a submission is still in flight");
        }
        Ok(self.page)
    }

    /// Apply a key press. Events are dispatched right away and a quit is handed back.
    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        let alert_open = self.page.alert().is_some();
        match self.cursor.handle_key(key, self.page.controller(), alert_open)? {
            Action::Dispatch(event) => {
                self.page.dispatch(event);
                self.sync_cursor();
                None
            }
            Action::Quit => Some(Action::Quit),
        }
    }

    /// Focus the first control whenever a different section is shown.
    fn sync_cursor(&mut self) {
        if self.page.controller_mut().take_scroll_request() {
            self.cursor.reset();
        }
    }

    fn draw(&mut self, stdout: &mut Stdout) -> io::Result<()> {
        self.sync_cursor();
        let (columns, rows) = self.size;
        let view = View {
            controller: self.page.controller(),
            background: self.page.animation().map(|animation| animation.surface()),
            cursor: &self.cursor,
            alert: self.page.alert(),
            submitting: self.page.is_submitting(),
        };
        compose(&view, columns, rows, self.backdrop).flush(stdout)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TerminalError {
    #[error("setting up terminal: {0}")]
    Setup(io::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),
}
