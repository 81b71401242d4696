use std::fmt;

pub const GLOBAL_SLOTS: usize = 26;

/// The 26 integer cells backing variables `a` through `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Globals {
    cells: [i32; GLOBAL_SLOTS],
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` for a slot outside `0..26`.
    pub fn get(&self, slot: u8) -> Option<i32> {
        self.cells.get(usize::from(slot)).copied()
    }

    /// Returns `false` and leaves the store untouched for a slot outside `0..26`.
    pub fn set(&mut self, slot: u8, value: i32) -> bool {
        match self.cells.get_mut(usize::from(slot)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Looks a variable up by its letter.
    pub fn value_of(&self, name: char) -> Option<i32> {
        if !name.is_ascii_lowercase() {
            return None;
        }
        self.get(name as u8 - b'a')
    }

    /// Non-zero variables in alphabetical order.
    pub fn non_zero(&self) -> impl Iterator<Item = (char, i32)> + '_ {
        self.cells
            .iter()
            .zip(b'a'..=b'z')
            .filter(|(value, _)| **value != 0)
            .map(|(value, letter)| (char::from(letter), *value))
    }
}

/// Formats the final report, one `<letter> = <value>` line per non-zero slot.
impl fmt::Display for Globals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.non_zero() {
            writeln!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}
