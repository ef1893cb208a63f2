//! Keka attendance API
//!
//! `perform` is the scheduled entry point: weekday gate, credential load and
//! refresh, then a single clock in/out call.

pub mod client;
mod clock;

use std::fmt;
use std::str::FromStr;

pub use clock::{perform, Outcome};

/// Which punch to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Keka `originalPunchStatus`
    pub fn punch_status(self) -> u8 {
        match self {
            Direction::In => 0,
            Direction::Out => 1,
        }
    }

    pub fn note(self) -> &'static str {
        match self {
            Direction::In => "In",
            Direction::Out => "Out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        })
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(format!("Unknown direction: {}. Use: in, out", other)),
        }
    }
}
