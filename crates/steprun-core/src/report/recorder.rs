//! In-memory event buffer owned by one worker.

use super::{Formatter, Node, StepEvent};
use crate::outcome::RunSummary;
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Node(Node),
    Step(StepEvent),
}

/// Records events in arrival order so they can be replayed into the real
/// formatter after the worker joins.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Vec<Event>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Steps recorded so far, in order.
    pub fn steps(&self) -> impl Iterator<Item = &StepEvent> {
        self.events.iter().filter_map(|e| match e {
            Event::Step(s) => Some(s),
            Event::Node(_) => None,
        })
    }

    pub fn replay(&self, target: &mut dyn Formatter) -> io::Result<()> {
        for event in &self.events {
            match event {
                Event::Node(node) => target.on_node(node)?,
                Event::Step(step) => target.on_step(step)?,
            }
        }
        Ok(())
    }
}

impl Formatter for Recorder {
    fn on_node(&mut self, node: &Node) -> io::Result<()> {
        self.events.push(Event::Node(node.clone()));
        Ok(())
    }

    fn on_step(&mut self, event: &StepEvent) -> io::Result<()> {
        self.events.push(Event::Step(event.clone()));
        Ok(())
    }

    fn on_run_complete(&mut self, _summary: &RunSummary) -> io::Result<()> {
        Ok(())
    }
}
