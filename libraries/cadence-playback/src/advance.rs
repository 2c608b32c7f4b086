//! Queue advance algorithm
//!
//! Shared by next, previous and end-of-track handling. Order of rules:
//! 1. empty queue: nothing
//! 2. repeat one: the current index
//! 3. shuffle: a uniformly random index
//! 4. step by one, wrapping only under repeat all

use cadence_core::RepeatMode;
use rand::Rng;

/// Step direction through the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Queue position to play next, if any
///
/// With no current index, stepping forward starts at the head and stepping
/// backward starts at the tail.
pub fn next_index<R: Rng + ?Sized>(
    len: usize,
    current: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    direction: Direction,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    if repeat == RepeatMode::One {
        return current.filter(|index| *index < len);
    }

    if shuffle {
        return Some(rng.gen_range(0..len));
    }

    let wrap = repeat == RepeatMode::All;
    match (direction, current) {
        (Direction::Forward, None) => Some(0),
        (Direction::Backward, None) => Some(len - 1),
        (Direction::Forward, Some(index)) if index + 1 < len => Some(index + 1),
        (Direction::Forward, Some(_)) => wrap.then_some(0),
        (Direction::Backward, Some(index)) if index > 0 => Some((index - 1).min(len - 1)),
        (Direction::Backward, Some(_)) => wrap.then_some(len - 1),
    }
}
