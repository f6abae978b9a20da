use winit::keyboard::{KeyCode, PhysicalKey};

/// Global keyboard shortcuts. These fire regardless of which UI widget
/// has focus since the dock has no text inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    TogglePlayPause,
    ResetCamera,
    Quit,
}

pub fn shortcut(key: PhysicalKey) -> Option<InputAction> {
    match key {
        PhysicalKey::Code(KeyCode::Space) => Some(InputAction::TogglePlayPause),
        PhysicalKey::Code(KeyCode::KeyR) => Some(InputAction::ResetCamera),
        PhysicalKey::Code(KeyCode::Escape) => Some(InputAction::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_maps_to_play_pause() {
        assert_eq!(
            shortcut(PhysicalKey::Code(KeyCode::Space)),
            Some(InputAction::TogglePlayPause)
        );
    }

    #[test]
    fn r_maps_to_camera_reset() {
        assert_eq!(
            shortcut(PhysicalKey::Code(KeyCode::KeyR)),
            Some(InputAction::ResetCamera)
        );
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(shortcut(PhysicalKey::Code(KeyCode::KeyQ)), None);
    }
}
