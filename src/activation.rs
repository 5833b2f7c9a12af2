use std::cell::RefCell;
use std::rc::Rc;

use log::info;

/// A comma separated tag list that matches can be appended to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    text: String,
}

impl Accumulator {
    pub fn new(text: impl Into<String>) -> Self {
        Self{text: text.into()}
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push(&mut self, item: &str) {
        if self.text.trim().is_empty() {
            self.text = item.to_string();
        } else {
            self.text.push_str(", ");
            self.text.push_str(item);
        }
    }

    /// The individual tags, trimmed, without empty ones.
    pub fn entries(&self) -> Vec<String> {
        self.text.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
    }
}

/// Called when a rendered match is activated.
///
/// Returns the new query text when the activation rewrites the query field.
pub trait Activate {
    fn activate(&mut self, item: &str) -> Option<String>;
}

impl<F: FnMut(&str)> Activate for F {
    fn activate(&mut self, item: &str) -> Option<String> {
        self(item);
        None
    }
}

/// Appends activated matches to a shared accumulator.
#[derive(Debug, Clone)]
pub struct AppendTo {
    target: Rc<RefCell<Accumulator>>,
}

impl AppendTo {
    pub fn new(target: Rc<RefCell<Accumulator>>) -> Self {
        Self{target}
    }
}

impl Activate for AppendTo {
    fn activate(&mut self, item: &str) -> Option<String> {
        self.target.borrow_mut().push(item);
        info!("appended {item:?} to accumulator");
        None
    }
}

/// Replaces the query text with the activated match.
#[derive(Debug, Copy, Clone, Default)]
pub struct ReplaceQuery;

impl Activate for ReplaceQuery {
    fn activate(&mut self, item: &str) -> Option<String> {
        info!("replacing query with {item:?}");
        Some(item.to_string())
    }
}
