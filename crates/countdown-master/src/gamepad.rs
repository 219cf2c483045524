use countdown_core::gamepad::PadButton;
use gilrs::{Button, Gilrs};

/// Reads the first connected controller through gilrs.
pub struct GamepadReader {
    gilrs: Option<Gilrs>,
}

impl GamepadReader {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(err) => {
                tracing::warn!("gamepad input unavailable: {err}");
                None
            }
        };
        Self { gilrs }
    }

    pub fn is_available(&self) -> bool {
        self.gilrs.is_some()
    }

    /// Pressed-button mask, or `None` when no controller is connected.
    pub fn read_buttons(&mut self) -> Option<u16> {
        let gilrs = self.gilrs.as_mut()?;
        // Button state only updates as events are drained.
        while gilrs.next_event().is_some() {}
        let (_, pad) = gilrs.gamepads().next()?;
        let mask = PadButton::ALL
            .into_iter()
            .filter(|button| pad.is_pressed(gilrs_button(*button)))
            .fold(0, |mask, button| mask | button.mask());
        Some(mask)
    }
}

fn gilrs_button(button: PadButton) -> Button {
    match button {
        PadButton::DPadUp => Button::DPadUp,
        PadButton::DPadDown => Button::DPadDown,
        PadButton::DPadLeft => Button::DPadLeft,
        PadButton::DPadRight => Button::DPadRight,
        PadButton::Start => Button::Start,
        PadButton::Back => Button::Select,
        PadButton::LeftStick => Button::LeftThumb,
        PadButton::RightStick => Button::RightThumb,
        PadButton::LeftShoulder => Button::LeftTrigger,
        PadButton::RightShoulder => Button::RightTrigger,
        PadButton::A => Button::South,
        PadButton::B => Button::East,
        PadButton::X => Button::West,
        PadButton::Y => Button::North,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn face_buttons_follow_xbox_layout() {
        assert_eq!(gilrs_button(PadButton::A), Button::South);
        assert_eq!(gilrs_button(PadButton::Y), Button::North);
        assert_eq!(gilrs_button(PadButton::LeftShoulder), Button::LeftTrigger);

        let mapped: HashSet<Button> = PadButton::ALL.into_iter().map(gilrs_button).collect();
        assert_eq!(mapped.len(), PadButton::ALL.len());
    }
}
