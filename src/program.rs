//! Program storage: compiled statements kept in line-number order.

use crate::ast::{LineNumber, Stmt};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramStore {
    lines: BTreeMap<LineNumber, Stmt>,
}

impl ProgramStore {
    pub fn new() -> Self {
        Self {
            lines: BTreeMap::new(),
        }
    }

    /// Stores a line, returning the statement it replaced.
    pub fn insert(&mut self, number: LineNumber, stmt: Stmt) -> Option<Stmt> {
        self.lines.insert(number, stmt)
    }

    pub fn get(&self, number: LineNumber) -> Option<&Stmt> {
        self.lines.get(&number)
    }

    /// Removing an absent line is a no-op.
    pub fn remove(&mut self, number: LineNumber) -> Option<Stmt> {
        self.lines.remove(&number)
    }

    /// Removes every line in `first..=last` and returns how many there were.
    pub fn remove_range(&mut self, first: LineNumber, last: LineNumber) -> usize {
        if first > last {
            return 0;
        }
        let mut doomed = self.lines.split_off(&first);
        let mut kept = match last.checked_add(1) {
            Some(after) => doomed.split_off(&after),
            None => BTreeMap::new(),
        };
        self.lines.append(&mut kept);
        doomed.len()
    }

    /// The first stored line whose number is at least `number`.
    pub fn first_at_or_after(&self, number: LineNumber) -> Option<(LineNumber, &Stmt)> {
        self.lines
            .range(number..)
            .next()
            .map(|(number, stmt)| (*number, stmt))
    }

    /// Lines in `first..=last`, ascending.
    pub fn range(
        &self,
        first: LineNumber,
        last: LineNumber,
    ) -> impl Iterator<Item = (LineNumber, &Stmt)> + '_ {
        self.lines
            .range(first..)
            .take_while(move |(number, _)| **number <= last)
            .map(|(number, stmt)| (*number, stmt))
    }

    pub fn lines(&self) -> impl Iterator<Item = (LineNumber, &Stmt)> + '_ {
        self.lines.iter().map(|(number, stmt)| (*number, stmt))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
