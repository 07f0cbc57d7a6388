//! Inbound input model: the three wall buttons and the events they form.

use core::fmt;

/// One physical button line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Button {
    Up = 0b001,
    Stop = 0b010,
    Down = 0b100,
}

impl Button {
    /// Dispatch order within a tick.
    pub const ALL: [Self; 3] = [Self::Up, Self::Stop, Self::Down];

    pub const fn mask(self) -> u8 {
        self as u8
    }
}

/// Set of button lines, packed into the low three bits of a byte so it can
/// live in an `AtomicU8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const EMPTY: Self = Self(0);
    const VALID: u8 = 0b111;

    /// Build from raw bits; bits outside the three lines are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::VALID)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button.mask();
    }

    pub fn remove(&mut self, button: Button) {
        self.0 &= !button.mask();
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Both Up and Down: the re-pair gesture.
    pub const fn is_repair_gesture(self) -> bool {
        self.contains(Button::Up) && self.contains(Button::Down)
    }

    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

impl From<Button> for ButtonSet {
    fn from(button: Button) -> Self {
        Self(button.mask())
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for b in iter {
            set.insert(b);
        }
        set
    }
}

impl fmt::Display for ButtonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |b, c| if self.contains(b) { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(Button::Up, 'U'),
            flag(Button::Stop, 'S'),
            flag(Button::Down, 'D')
        )
    }
}

/// What the controller acts on.  The re-pair gesture is its own event, never
/// an Up and a Down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Pressed(Button),
    Repair,
}
