use std::io::{self, stdout, Write};
use std::panic;

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TermPos {
    pub col: usize,
    pub row: usize,
}

impl TermPos {
    pub fn new(col: usize, row: usize) -> Self {
        Self{col, row}
    }

    pub fn goto<W: Write>(&self, out: &mut W) -> io::Result<()> {
        use crossterm::{queue, cursor};
        let col = u16::try_from(self.col).unwrap_or(u16::MAX);
        let row = u16::try_from(self.row).unwrap_or(u16::MAX);
        queue!(out, cursor::MoveTo(col, row))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TermBox {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

impl TermBox {
    pub fn new(left: usize, right: usize, top: usize, bottom: usize) -> Self {
        Self{left, right, top, bottom}
    }

    pub fn window() -> io::Result<Self> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok(Self::new(0, cols.into(), 0, rows.into()))
    }

    pub fn begin(&self) -> TermPos {
        TermPos::new(self.left, self.top)
    }

    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }

    pub fn contains(&self, pos: TermPos) -> bool {
        (self.left..self.right).contains(&pos.col) && (self.top..self.bottom).contains(&pos.row)
    }

    /// The box left after removing `rows` rows from the top.
    pub fn below(&self, rows: usize) -> Self {
        let top = usize::min(self.top + rows, self.bottom);
        Self{top, ..*self}
    }

    /// A box of at most `rows` rows starting at the top of this one.
    pub fn take(&self, rows: usize) -> Self {
        let bottom = usize::min(self.top + rows, self.bottom);
        Self{bottom, ..*self}
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Up,
    Down,
    Left,
    Right,
    Esc,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Enter,
    Char(char),
    Click(TermPos),
}

/// Maps a raw terminal event to the events widgets understand.
pub fn convert_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(key_event) => {
            if key_event.kind == KeyEventKind::Release {
                return None;
            }
            match (key_event.modifiers, key_event.code) {
                (KeyModifiers::NONE, KeyCode::Esc) => Some(InputEvent::Esc),
                (KeyModifiers::NONE, KeyCode::Enter) => Some(InputEvent::Enter),
                (KeyModifiers::NONE, KeyCode::Up) => Some(InputEvent::Up),
                (KeyModifiers::NONE, KeyCode::Down) => Some(InputEvent::Down),
                (KeyModifiers::NONE, KeyCode::Left) => Some(InputEvent::Left),
                (KeyModifiers::NONE, KeyCode::Right) => Some(InputEvent::Right),
                (KeyModifiers::NONE, KeyCode::Backspace) => Some(InputEvent::Backspace),
                (KeyModifiers::NONE, KeyCode::Delete) => Some(InputEvent::Delete),
                (KeyModifiers::NONE, KeyCode::Tab) => Some(InputEvent::Tab),
                (KeyModifiers::SHIFT, KeyCode::BackTab) => Some(InputEvent::BackTab),
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(InputEvent::Esc),
                (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => Some(InputEvent::Char(c)),
                _ => None,
            }
        },
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                Some(InputEvent::Click(TermPos::new(mouse_event.column.into(), mouse_event.row.into())))
            },
            _ => None,
        },
        _ => None,
    }
}

pub trait TermElement {
    /// What the element hands back when it is done.
    type Output;

    fn display<W: Write>(&self, out: &mut W, element_box: TermBox) -> io::Result<()>;

    fn set_cursor<W: Write>(&self, out: &mut W, element_box: TermBox) -> io::Result<()>;

    /// Handles one event; `Some` ends the element's run.
    fn input(&mut self, event: InputEvent, element_box: TermBox) -> Option<Self::Output>;
}

/// Raw mode, alternate screen and mouse capture, undone on drop or panic.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new() -> io::Result<Self> {
        use crossterm::{
            terminal::{enable_raw_mode, EnterAlternateScreen},
            event::EnableMouseCapture,
            execute,
        };

        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = restore_terminal();
            original_hook(panic_info);
        }));

        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}

fn restore_terminal() -> io::Result<()> {
    use crossterm::{
        terminal::{disable_raw_mode, LeaveAlternateScreen},
        event::DisableMouseCapture,
        execute,
        cursor,
    };

    disable_raw_mode()?;
    execute!(stdout(), DisableMouseCapture, cursor::Show, cursor::SetCursorStyle::DefaultUserShape, LeaveAlternateScreen)
}
