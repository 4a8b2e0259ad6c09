//! Decoding of raw `buttonevent` codes into controller-facing press events.
//!
//! The gateway numbers buttons in the thousands digit (1 = on side,
//! 2 = off side) and gestures in the low digits. Only the four codes below
//! are final gestures; everything else (hold-start markers, unknown
//! gestures, other button layouts) decodes to no event. A frame carrying an
//! intermediate code is always followed by a frame with the final code for
//! the same physical press, so dropping them loses nothing.

use serde::{Deserialize, Serialize};

pub const BUTTON_ON_SHORT_PRESS: u32 = 1002;
pub const BUTTON_ON_LONG_PRESS: u32 = 1001;
pub const BUTTON_OFF_SHORT_PRESS: u32 = 2002;
pub const BUTTON_OFF_LONG_PRESS: u32 = 2001;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub enum ButtonPress {
    #[serde(rename = "On Pressed")]
    OnPressed,
    #[serde(rename = "Off Pressed")]
    OffPressed,
    #[serde(rename = "On Long Pressed")]
    OnLongPressed,
    #[serde(rename = "Off Long Pressed")]
    OffLongPressed,
}

impl ButtonPress {
    /// Decode a final gesture code. Stateless; intermediate and unknown
    /// codes yield `None`.
    #[must_use]
    pub const fn decode(code: u32) -> Option<Self> {
        match code {
            BUTTON_ON_SHORT_PRESS => Some(Self::OnPressed),
            BUTTON_OFF_SHORT_PRESS => Some(Self::OffPressed),
            BUTTON_ON_LONG_PRESS => Some(Self::OnLongPressed),
            BUTTON_OFF_LONG_PRESS => Some(Self::OffLongPressed),
            _ => None,
        }
    }
}

/// Shape of the value forwarded to the controller for a decoded press.
///
/// `Semantic` distinguishes all four gestures. `Binary` is the legacy
/// two-value shape some controller setups expect: short presses map to a
/// plain boolean and long presses produce no event at all.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PressFormat {
    #[default]
    Semantic,
    Binary,
}

#[derive(Clone, Copy, Debug, Serialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum PressValue {
    Press(ButtonPress),
    Toggle(bool),
}

impl PressFormat {
    #[must_use]
    pub const fn decode(self, code: Option<u32>) -> Option<PressValue> {
        let Some(code) = code else {
            return None;
        };
        match self {
            Self::Semantic => match ButtonPress::decode(code) {
                Some(press) => Some(PressValue::Press(press)),
                None => None,
            },
            Self::Binary => match code {
                BUTTON_ON_SHORT_PRESS => Some(PressValue::Toggle(true)),
                BUTTON_OFF_SHORT_PRESS => Some(PressValue::Toggle(false)),
                _ => None,
            },
        }
    }
}
