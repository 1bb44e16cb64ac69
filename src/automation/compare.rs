//! Three-way comparison of the recognized operands and drawing the answer.

use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::fmt;

use crate::automation::config::SymbolStrokes;
use crate::automation::input::Swipe;
use crate::capture::Device;

/// The answer drawn on the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    Greater,
    Less,
    Equal,
}

impl Symbol {
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Greater => Symbol::Greater,
            Ordering::Less => Symbol::Less,
            Ordering::Equal => Symbol::Equal,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Symbol::Greater => '>',
            Symbol::Less => '<',
            Symbol::Equal => '=',
        }
    }

    pub fn strokes<'a>(&self, strokes: &'a SymbolStrokes) -> &'a [Swipe; 2] {
        match self {
            Symbol::Greater => &strokes.greater,
            Symbol::Less => &strokes.less,
            Symbol::Equal => &strokes.equal,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Compares two recognized numbers.
///
/// Fails if either side is not a non-negative integer that fits in a u64.
pub fn compare_numbers(left: &str, right: &str) -> Result<Symbol> {
    let x: u64 = left
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a valid number", left))?;
    let y: u64 = right
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a valid number", right))?;
    Ok(Symbol::from_ordering(x.cmp(&y)))
}

/// Draws `symbol` as two consecutive swipes.
pub fn draw_symbol(device: &dyn Device, symbol: Symbol, strokes: &SymbolStrokes) -> Result<()> {
    for swipe in symbol.strokes(strokes) {
        device
            .swipe(swipe)
            .with_context(|| format!("Failed to draw '{}'", symbol))?;
    }
    Ok(())
}
