//! The exit puzzle: a two-operand addition problem with a small attempt
//! budget, driven by digit/backspace/submit events from the frontend.

use rand::Rng;

pub const ATTEMPT_BUDGET: u32 = 3;
const OPERAND_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// Explicit puzzle state, one value per distinct situation the frontend has
/// to present.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PuzzleState {
    /// Waiting for the player to type an answer.
    AwaitingInput,
    /// Last submission parsed but was wrong; an attempt was consumed.
    Rejected,
    /// Last submission was empty or non-numeric; no attempt consumed.
    InvalidFormat,
    /// Correct answer given.
    Solved,
    /// Attempt budget spent without a correct answer.
    Exhausted,
}

#[derive(Debug)]
pub struct Puzzle {
    lhs: u32,
    rhs: u32,
    attempts_left: u32,
    input: String,
    state: PuzzleState,
}

impl Puzzle {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            lhs: rng.gen_range(OPERAND_RANGE),
            rhs: rng.gen_range(OPERAND_RANGE),
            attempts_left: ATTEMPT_BUDGET,
            input: String::new(),
            state: PuzzleState::AwaitingInput,
        }
    }

    pub fn prompt(&self) -> String {
        format!("{} + {} = ?", self.lhs, self.rhs)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn attempts_left(&self) -> u32 {
        self.attempts_left
    }

    pub fn state(&self) -> PuzzleState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, PuzzleState::Solved | PuzzleState::Exhausted)
    }

    pub fn push_digit(&mut self, digit: char) {
        if self.is_resolved() || !digit.is_ascii_digit() {
            return;
        }
        // A fresh keystroke clears a stale rejection notice.
        if matches!(self.state, PuzzleState::Rejected | PuzzleState::InvalidFormat) {
            self.state = PuzzleState::AwaitingInput;
        }
        if self.input.len() < 6 {
            self.input.push(digit);
        }
    }

    pub fn backspace(&mut self) {
        if !self.is_resolved() {
            self.input.pop();
        }
    }

    /// Judges the current buffer. Unparsable input re-prompts without
    /// consuming an attempt; a wrong numeric answer consumes one.
    pub fn submit(&mut self) -> PuzzleState {
        if self.is_resolved() {
            return self.state;
        }
        let answer = self.input.trim().parse::<u32>();
        self.input.clear();
        self.state = match answer {
            Err(_) => PuzzleState::InvalidFormat,
            Ok(value) if value == self.lhs + self.rhs => PuzzleState::Solved,
            Ok(_) => {
                self.attempts_left -= 1;
                if self.attempts_left == 0 {
                    PuzzleState::Exhausted
                } else {
                    PuzzleState::Rejected
                }
            }
        };
        self.state
    }

    #[cfg(test)]
    pub fn answer(&self) -> u32 {
        self.lhs + self.rhs
    }
}
