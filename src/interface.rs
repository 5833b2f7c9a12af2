use std::cell::RefCell;
use std::fmt;
use std::io::{self, stdout, Write};
use std::rc::Rc;

use crossterm::event::EventStream;
use futures::StreamExt;
use log::{info, warn};

use crate::activation::{Accumulator, Activate, AppendTo, ReplaceQuery};
use crate::config::{ActivateMode, Config};
use crate::error::{Error, FetchError, FilterError};
use crate::filter::{FilterList, Refresh};
use crate::source::{self, Endpoint};
use crate::term::{convert_event, InputEvent, TermBox, TermElement, TermPos, TerminalGuard};

/// What the user left the search box with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submit {
    Query(String),
    Tags(Vec<String>),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Loading,
    FetchFailed(String),
    Idle,
    Matches(usize),
    NotLoaded,
    InvalidPattern(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Loading => write!(f, "loading source list..."),
            Status::FetchFailed(err) => write!(f, "could not load source list: {err}"),
            Status::Idle => Ok(()),
            Status::Matches(1) => write!(f, "1 match"),
            Status::Matches(n) => write!(f, "{n} matches"),
            Status::NotLoaded => write!(f, "{}", FilterError::Unloaded),
            Status::InvalidPattern(err) => write!(f, "invalid pattern: {}", err.lines().last().unwrap_or_default()),
        }
    }
}

/// A query field with its live result list and, optionally, the accumulator it feeds.
pub struct SearchBox {
    text: String,
    decor_prefix: char,
    decor_suffix: char,
    filter: FilterList,
    selection: Option<usize>,
    status: Status,
    fetch_error: Option<String>,
    on_activate: Box<dyn Activate>,
    accumulator: Option<Rc<RefCell<Accumulator>>>,
}

impl SearchBox {
    /// Rows above the result list: query, accumulator, status.
    const HEADER_ROWS: usize = 3;

    pub fn new(filter: FilterList, on_activate: Box<dyn Activate>) -> Self {
        Self {
            text: String::new(),
            decor_prefix: '<',
            decor_suffix: '>',
            filter,
            selection: None,
            status: Status::Loading,
            fetch_error: None,
            on_activate,
            accumulator: None,
        }
    }

    pub fn with_accumulator(mut self, accumulator: Rc<RefCell<Accumulator>>) -> Self {
        self.accumulator = Some(accumulator);
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let filter = FilterList::new(config.min_query_len, config.match_mode);
        match config.on_activate {
            ActivateMode::Append => {
                let accumulator = Rc::new(RefCell::new(Accumulator::new(config.accumulator.clone())));
                Self::new(filter, Box::new(AppendTo::new(accumulator.clone()))).with_accumulator(accumulator)
            },
            ActivateMode::Replace => Self::new(filter, Box::new(ReplaceQuery)),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The entries currently rendered.
    pub fn entries(&self) -> &[String] {
        self.filter.matches()
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Hands the outcome of the source fetch to the filter.
    pub fn load(&mut self, fetched: Result<Vec<String>, FetchError>) {
        match fetched {
            Ok(list) => match self.filter.load(list) {
                Ok(()) => self.refresh(),
                Err(err) => warn!("ignoring source list: {err}"),
            },
            Err(err) => {
                warn!("source list unavailable, staying unloaded: {err}");
                self.fetch_error = Some(err.to_string());
                self.status = self.pending_status();
            },
        }
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.selection = None;
        self.status = match self.filter.update(&self.text) {
            Ok(Refresh::Cleared) if !self.filter.is_ready() => self.pending_status(),
            Ok(Refresh::Cleared) => Status::Idle,
            Ok(Refresh::Matched(n)) => Status::Matches(n),
            Ok(Refresh::InvalidPattern(err)) => Status::InvalidPattern(err),
            Err(err) => {
                warn!("query {:?}: {err}", self.text);
                match &self.fetch_error {
                    Some(fetch_error) => Status::FetchFailed(fetch_error.clone()),
                    None => Status::NotLoaded,
                }
            },
        };
    }

    fn pending_status(&self) -> Status {
        match &self.fetch_error {
            Some(err) => Status::FetchFailed(err.clone()),
            None => Status::Loading,
        }
    }

    /// Runs the activation strategy for the `index`-th rendered entry.
    pub fn activate(&mut self, index: usize) {
        let Some(item) = self.entries().get(index).cloned() else {
            return;
        };
        info!("activated {item:?}");
        if let Some(text) = self.on_activate.activate(&item) {
            self.set_query(text);
        }
    }

    fn submit(&self) -> Submit {
        match &self.accumulator {
            Some(accumulator) => Submit::Tags(accumulator.borrow().entries()),
            None => Submit::Query(self.text.clone()),
        }
    }

    fn results_box(&self, element_box: TermBox) -> TermBox {
        element_box.below(Self::HEADER_ROWS)
    }

    /// The rendered entry under `pos`, if any.
    pub fn entry_at(&self, pos: TermPos, element_box: TermBox) -> Option<usize> {
        let results = self.results_box(element_box);
        if !results.contains(pos) {
            return None;
        }
        let index = pos.row - results.top;
        (index < self.entries().len()).then_some(index)
    }
}

impl TermElement for SearchBox {
    type Output = Submit;

    fn display<W: Write>(&self, out: &mut W, element_box: TermBox) -> io::Result<()> {
        use crossterm::{
            queue,
            style::{PrintStyledContent, Stylize},
        };

        let width = element_box.width();
        let clip = |text: String| text.chars().take(width).collect::<String>();

        let mut query = clip(format!("{}{}{}", self.decor_prefix, self.text, self.decor_suffix)).bold();
        if self.selection.is_none() {
            query = query.reverse();
        }
        element_box.begin().goto(out)?;
        queue!(out, PrintStyledContent(query))?;

        if let Some(accumulator) = &self.accumulator {
            TermPos::new(element_box.left, element_box.top + 1).goto(out)?;
            queue!(out, PrintStyledContent(clip(format!("[{}]", accumulator.borrow().text())).dim()))?;
        }

        TermPos::new(element_box.left, element_box.top + 2).goto(out)?;
        queue!(out, PrintStyledContent(clip(self.status.to_string()).italic()))?;

        let results = self.results_box(element_box);
        for (row, (n, entry)) in (results.top..results.bottom).zip(self.entries().iter().enumerate()) {
            let tmp = if Some(n) == self.selection {
                clip(format!(">{}<", entry)).bold().reverse()
            } else {
                clip(format!(" {} ", entry)).bold()
            };
            TermPos::new(results.left, row).goto(out)?;
            queue!(out, PrintStyledContent(tmp))?;
        }

        Ok(())
    }

    fn set_cursor<W: Write>(&self, out: &mut W, element_box: TermBox) -> io::Result<()> {
        use crossterm::{queue, cursor};

        TermPos::new(element_box.left + 1 + self.text.chars().count(), element_box.top).goto(out)?;
        queue!(out, cursor::Show)?;
        if self.selection.is_none() {
            queue!(out, cursor::SetCursorStyle::BlinkingBar)
        } else {
            queue!(out, cursor::SetCursorStyle::SteadyBar)
        }
    }

    fn input(&mut self, event: InputEvent, element_box: TermBox) -> Option<Submit> {
        use InputEvent::*;

        match event {
            Esc => return Some(Submit::Quit),
            Backspace => {
                let _ = self.text.pop();
                self.refresh();
            },
            Char(c) => {
                self.text.push(c);
                self.refresh();
            },
            Down => {
                if !self.entries().is_empty() {
                    self.selection = Some(self.selection.map_or(0, |x| usize::min(x+1, self.entries().len()-1)));
                }
            },
            Up => {
                self.selection = match self.selection {
                    None | Some(0) => None,
                    Some(x) => Some(x-1),
                }
            },
            Enter => match self.selection {
                Some(n) => self.activate(n),
                None => return Some(self.submit()),
            },
            Click(pos) => {
                if let Some(n) = self.entry_at(pos, element_box) {
                    self.activate(n);
                }
            },
            _ => (),
        }

        None
    }
}

fn draw<W: Write>(out: &mut W, search: &SearchBox, window: TermBox) -> io::Result<()> {
    use crossterm::{
        terminal::{Clear, ClearType},
        queue,
        cursor,
        style::Print,
    };

    queue!(out, Clear(ClearType::All), cursor::Hide, cursor::MoveTo(0, 0), Print("Press ESC to quit, Enter to submit."))?;
    search.display(out, window.below(2))?;
    search.set_cursor(out, window.below(2))?;
    out.flush()
}

/// Runs the search box until the user submits or quits.
///
/// The source list is fetched while the user is already typing; its completion is the only
/// event besides terminal input.
pub async fn app(config: &Config) -> Result<Submit, Error> {
    let mut search = SearchBox::from_config(config);

    let client = reqwest::Client::new();
    let endpoint = Endpoint::parse(&config.endpoint);
    let fetch = source::fetch(&client, &endpoint, &config.field);
    tokio::pin!(fetch);
    let mut fetching = true;

    let _guard = TerminalGuard::new()?;
    let mut events = EventStream::new();
    let mut out = stdout();

    loop {
        let window = TermBox::window()?;
        draw(&mut out, &search, window)?;

        tokio::select! {
            fetched = &mut fetch, if fetching => {
                fetching = false;
                search.load(fetched);
            },
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if let Some(submit) = convert_event(event).and_then(|e| search.input(e, window.below(2))) {
                        info!("leaving with {submit:?}");
                        return Ok(submit);
                    }
                },
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(Submit::Quit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchMode;

    fn tropes() -> Vec<String> {
        ["Chekhov's Gun", "Red Herring", "MacGuffin"].map(String::from).to_vec()
    }

    fn area() -> TermBox {
        TermBox::new(0, 40, 0, 10)
    }

    /// A search box whose activations are recorded in the returned log.
    fn recording() -> (SearchBox, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let mut search = SearchBox::new(
            FilterList::new(2, MatchMode::Pattern),
            Box::new(move |item: &str| sink.borrow_mut().push(item.to_string())),
        );
        search.load(Ok(tropes()));
        (search, log)
    }

    fn type_text(search: &mut SearchBox, text: &str) {
        for c in text.chars() {
            search.input(InputEvent::Char(c), area());
        }
    }

    #[test]
    fn test_typing_filters() {
        let (mut search, _) = recording();
        type_text(&mut search, "gun");
        assert_eq!(search.entries(), ["Chekhov's Gun"]);
        search.input(InputEvent::Backspace, area());
        assert!(search.entries().is_empty());
    }

    #[test]
    fn test_click_activates_once() {
        let (mut search, log) = recording();
        type_text(&mut search, "ring");
        assert_eq!(search.entries(), ["Red Herring"]);

        let row = area().top + SearchBox::HEADER_ROWS;
        assert_eq!(search.input(InputEvent::Click(TermPos::new(3, row)), area()), None);
        assert_eq!(*log.borrow(), ["Red Herring"]);

        // Below the last entry and on the query line
        search.input(InputEvent::Click(TermPos::new(3, row + 1)), area());
        search.input(InputEvent::Click(TermPos::new(3, 0)), area());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_enter_activates_selection() {
        let (mut search, log) = recording();
        type_text(&mut search, "e.*n");
        search.input(InputEvent::Down, area());
        search.input(InputEvent::Down, area());
        search.input(InputEvent::Down, area());
        assert_eq!(search.selection(), Some(1));
        assert_eq!(search.input(InputEvent::Enter, area()), None);
        assert_eq!(*log.borrow(), ["Red Herring"]);
    }

    #[test]
    fn test_append_variant() {
        let config = Config::default();
        let mut search = SearchBox::from_config(&config);
        search.load(Ok(tropes()));
        type_text(&mut search, "red");
        assert_eq!(search.entries(), ["Red Herring"]);

        search.activate(0);
        let accumulator = search.accumulator.clone().unwrap();
        assert_eq!(accumulator.borrow().text(), "Haunted House, Ironic Nursery Tune, Red Herring");
        // Query is left alone
        assert_eq!(search.text(), "red");

        assert_eq!(
            search.input(InputEvent::Enter, area()),
            Some(Submit::Tags(vec!["Haunted House".into(), "Ironic Nursery Tune".into(), "Red Herring".into()])),
        );
    }

    #[test]
    fn test_replace_variant() {
        let config = Config{on_activate: ActivateMode::Replace, ..Config::default()};
        let mut search = SearchBox::from_config(&config);
        search.load(Ok(tropes()));
        type_text(&mut search, "guf");
        search.activate(0);

        assert_eq!(search.text(), "MacGuffin");
        assert_eq!(search.entries(), ["MacGuffin"]);
        assert_eq!(search.input(InputEvent::Enter, area()), Some(Submit::Query("MacGuffin".to_string())));
    }

    #[test]
    fn test_query_before_load() {
        let mut search = SearchBox::from_config(&Config::default());
        type_text(&mut search, "gun");
        assert_eq!(search.status, Status::NotLoaded);
        assert!(search.entries().is_empty());

        // Typed text is matched as soon as the list arrives
        search.load(Ok(tropes()));
        assert_eq!(search.status, Status::Matches(1));
        assert_eq!(search.entries(), ["Chekhov's Gun"]);
    }

    #[test]
    fn test_failed_fetch_stays_unloaded() {
        let mut search = SearchBox::from_config(&Config::default());
        search.load(Err(FetchError::Malformed("missing field \"tropes\"".into())));
        type_text(&mut search, "gun");
        assert!(matches!(search.status, Status::FetchFailed(_)));
        assert!(search.entries().is_empty());
    }

    #[test]
    fn test_invalid_pattern_status() {
        let (mut search, _) = recording();
        type_text(&mut search, "gun(");
        assert!(matches!(search.status, Status::InvalidPattern(_)));
        assert!(search.entries().is_empty());
    }

    #[test]
    fn test_display_renders_entries() {
        let (mut search, _) = recording();
        type_text(&mut search, "e.*n");

        let mut out = Vec::new();
        search.display(&mut out, area()).unwrap();
        let screen = String::from_utf8_lossy(&out);
        assert!(screen.contains("Chekhov's Gun"));
        assert!(screen.contains("Red Herring"));
        assert!(!screen.contains("MacGuffin"));
        assert!(screen.contains("2 matches"));
    }

    #[test]
    fn test_esc_quits() {
        let (mut search, log) = recording();
        assert_eq!(search.input(InputEvent::Esc, area()), Some(Submit::Quit));
        assert!(log.borrow().is_empty());
    }
}
