//! Button descriptor types for physical Vantage controls

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for invalid button descriptors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ButtonError {
    #[error("button name cannot be empty")]
    EmptyName,

    #[error(
        "button name contains invalid characters (must be lowercase alphanumeric with underscores, cannot start/end with underscore)"
    )]
    InvalidNameChars,
}

/// The keypad station a button belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypad {
    /// Vantage object ID of the keypad
    pub vid: u32,

    /// Slugified keypad name
    pub name: String,
}

impl Keypad {
    /// Create a new keypad descriptor
    pub fn new(vid: u32, name: impl Into<String>) -> Result<Self, ButtonError> {
        let name = name.into();
        validate_slug(&name)?;
        Ok(Self { vid, name })
    }
}

/// Describes the physical button a press/release edge came from
///
/// The VID is the Vantage controller's stable object ID and is the identity
/// used throughout the integration; the slugified name and keypad linkage are
/// carried so automations can match on them in event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    vid: u32,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    number: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keypad: Option<Keypad>,
}

impl Button {
    /// Create a new button descriptor from its VID and slugified name
    pub fn new(vid: u32, name: impl Into<String>) -> Result<Self, ButtonError> {
        let name = name.into();
        validate_slug(&name)?;
        Ok(Self {
            vid,
            name,
            number: None,
            keypad: None,
        })
    }

    /// Set the position of this button on its keypad
    pub fn with_number(mut self, number: u8) -> Self {
        self.number = Some(number);
        self
    }

    /// Set the keypad station this button belongs to
    pub fn with_keypad(mut self, keypad: Keypad) -> Self {
        self.keypad = Some(keypad);
        self
    }

    /// The Vantage object ID of this button
    pub fn vid(&self) -> u32 {
        self.vid
    }

    /// The slugified button name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The button's position on its keypad, if known
    pub fn number(&self) -> Option<u8> {
        self.number
    }

    /// The keypad station this button belongs to, if any
    pub fn keypad(&self) -> Option<&Keypad> {
        self.keypad.as_ref()
    }

    /// Build the event-payload projection of this descriptor
    pub fn info(&self) -> ButtonInfo {
        ButtonInfo {
            button: self.name.clone(),
            button_vid: self.vid,
            button_number: self.number,
            keypad_name: self.keypad.as_ref().map(|k| k.name.clone()),
            keypad_vid: self.keypad.as_ref().map(|k| k.vid),
        }
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (vid {})", self.name, self.vid)
    }
}

/// Button identification fields as they appear in event payloads
///
/// Field names match what automations consuming the bus events key on:
/// `button`, `button_vid`, `button_number`, `keypad_name`, `keypad_vid`.
/// Keypad fields are present only for buttons that belong to a keypad
/// station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonInfo {
    /// Slugified button name
    pub button: String,

    /// Vantage object ID of the button
    pub button_vid: u32,

    /// Position of the button on its keypad
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_number: Option<u8>,

    /// Slugified name of the owning keypad
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypad_name: Option<String>,

    /// Vantage object ID of the owning keypad
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypad_vid: Option<u32>,
}

/// Check that a name is a valid slug (lowercase alphanumeric + underscore,
/// cannot start/end with underscore)
fn validate_slug(s: &str) -> Result<(), ButtonError> {
    if s.is_empty() {
        return Err(ButtonError::EmptyName);
    }
    if s.starts_with('_') || s.ends_with('_') {
        return Err(ButtonError::InvalidNameChars);
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ButtonError::InvalidNameChars);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_button() {
        let button = Button::new(301, "kitchen_lights").unwrap();
        assert_eq!(button.vid(), 301);
        assert_eq!(button.name(), "kitchen_lights");
        assert_eq!(button.number(), None);
        assert!(button.keypad().is_none());
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(Button::new(1, "").unwrap_err(), ButtonError::EmptyName);
        assert_eq!(
            Button::new(1, "Kitchen").unwrap_err(),
            ButtonError::InvalidNameChars
        );
        assert_eq!(
            Button::new(1, "_leading").unwrap_err(),
            ButtonError::InvalidNameChars
        );
        assert_eq!(
            Button::new(1, "trailing_").unwrap_err(),
            ButtonError::InvalidNameChars
        );
        assert_eq!(
            Button::new(1, "with-dash").unwrap_err(),
            ButtonError::InvalidNameChars
        );
        // Middle underscores and digits are fine
        assert!(Button::new(1, "scene_2").is_ok());
    }

    #[test]
    fn test_keypad_linkage() {
        let keypad = Keypad::new(200, "hallway_station").unwrap();
        let button = Button::new(301, "all_off")
            .unwrap()
            .with_number(4)
            .with_keypad(keypad);

        let info = button.info();
        assert_eq!(info.button, "all_off");
        assert_eq!(info.button_vid, 301);
        assert_eq!(info.button_number, Some(4));
        assert_eq!(info.keypad_name.as_deref(), Some("hallway_station"));
        assert_eq!(info.keypad_vid, Some(200));
    }

    #[test]
    fn test_info_serde_skips_absent_keypad() {
        let button = Button::new(42, "porch").unwrap();
        let json = serde_json::to_value(button.info()).unwrap();

        assert_eq!(json["button"], "porch");
        assert_eq!(json["button_vid"], 42);
        assert!(json.get("button_number").is_none());
        assert!(json.get("keypad_name").is_none());
        assert!(json.get("keypad_vid").is_none());
    }
}
