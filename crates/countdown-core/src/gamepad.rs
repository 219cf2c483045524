//! Controller buttons that can be bound to Start and Clock.

/// Buttons of an Xbox-layout controller, with the bit each occupies in a
/// pressed-buttons mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadButton {
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Start,
    Back,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    A,
    B,
    X,
    Y,
}

impl PadButton {
    pub const ALL: [PadButton; 14] = [
        PadButton::DPadUp,
        PadButton::DPadDown,
        PadButton::DPadLeft,
        PadButton::DPadRight,
        PadButton::Start,
        PadButton::Back,
        PadButton::LeftStick,
        PadButton::RightStick,
        PadButton::LeftShoulder,
        PadButton::RightShoulder,
        PadButton::A,
        PadButton::B,
        PadButton::X,
        PadButton::Y,
    ];

    /// Name shown in the picker and stored in `settings.ini`.
    pub fn name(self) -> &'static str {
        match self {
            PadButton::DPadUp => "DPad Up",
            PadButton::DPadDown => "DPad Down",
            PadButton::DPadLeft => "DPad Left",
            PadButton::DPadRight => "DPad Right",
            PadButton::Start => "Start",
            PadButton::Back => "Back",
            PadButton::LeftStick => "Left Stick",
            PadButton::RightStick => "Right Stick",
            PadButton::LeftShoulder => "Left Shoulder",
            PadButton::RightShoulder => "Right Shoulder",
            PadButton::A => "A",
            PadButton::B => "B",
            PadButton::X => "X",
            PadButton::Y => "Y",
        }
    }

    pub fn mask(self) -> u16 {
        match self {
            PadButton::DPadUp => 0x0001,
            PadButton::DPadDown => 0x0002,
            PadButton::DPadLeft => 0x0004,
            PadButton::DPadRight => 0x0008,
            PadButton::Start => 0x0010,
            PadButton::Back => 0x0020,
            PadButton::LeftStick => 0x0040,
            PadButton::RightStick => 0x0080,
            PadButton::LeftShoulder => 0x0100,
            PadButton::RightShoulder => 0x0200,
            PadButton::A => 0x1000,
            PadButton::B => 0x2000,
            PadButton::X => 0x4000,
            PadButton::Y => 0x8000,
        }
    }

    /// Exact stored name; anything else, including an empty value, is unbound.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|button| button.name() == value)
    }
}

/// Turns successive pressed-button masks into newly pressed buttons, so holding
/// a button fires once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressTracker {
    previous: u16,
}

impl PressTracker {
    /// `None` means no controller could be read; the next reading starts fresh.
    pub fn update(&mut self, buttons: Option<u16>) -> u16 {
        let Some(buttons) = buttons else {
            self.previous = 0;
            return 0;
        };
        let new_presses = buttons & !self.previous;
        self.previous = buttons;
        new_presses
    }

    pub fn reset(&mut self) {
        self.previous = 0;
    }
}

/// True when `button` is bound and among `new_presses`.
pub fn pressed(new_presses: u16, button: Option<PadButton>) -> bool {
    button.is_some_and(|button| new_presses & button.mask() != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_and_masks_are_distinct() {
        let mut seen = 0u16;
        for button in PadButton::ALL {
            assert_eq!(PadButton::parse(button.name()), Some(button));
            assert_eq!(seen & button.mask(), 0);
            seen |= button.mask();
        }
        assert_eq!(PadButton::parse(" Left Shoulder "), Some(PadButton::LeftShoulder));
        assert_eq!(PadButton::parse(""), None);
        assert_eq!(PadButton::parse("a"), None);
    }

    #[test]
    fn held_buttons_fire_once() {
        let a = PadButton::A.mask();
        let start = PadButton::Start.mask();
        let mut presses = PressTracker::default();
        assert_eq!(presses.update(Some(a)), a);
        assert_eq!(presses.update(Some(a)), 0);
        assert_eq!(presses.update(Some(a | start)), start);
        assert_eq!(presses.update(Some(start)), 0);
        assert_eq!(presses.update(Some(0)), 0);
        assert_eq!(presses.update(Some(a)), a);
    }

    #[test]
    fn lost_controller_clears_held_state() {
        let b = PadButton::B.mask();
        let mut presses = PressTracker::default();
        assert_eq!(presses.update(Some(b)), b);
        assert_eq!(presses.update(None), 0);
        assert_eq!(presses.update(Some(b)), b);
        presses.reset();
        assert_eq!(presses.update(Some(b)), b);
    }

    #[test]
    fn only_bound_buttons_match() {
        let new_presses = PadButton::X.mask() | PadButton::DPadUp.mask();
        assert!(pressed(new_presses, Some(PadButton::X)));
        assert!(!pressed(new_presses, Some(PadButton::Y)));
        assert!(!pressed(new_presses, None));
    }
}
