use bevy::{prelude::*, window::CursorGrabMode};
use leafwing_input_manager::prelude::*;

#[derive(Debug)]
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugin(InputManagerPlugin::<Actions>::default())
            .add_startup_system(toggle_on_start)
            .add_system(toggle_mouse_capture);
    }
}

#[derive(Actionlike, Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Player actions.
pub enum Actions {
    Forward,
    Backwards,
    StrafeLeft,
    StrafeRight,
    Sprint,
    Jump,
    Aim,
    FirePortalA,
    FirePortalB,
    Grab,
    Zoom,
}

/// Keyboard and mouse bindings for the player actions.
pub fn default_input_map() -> InputMap<Actions> {
    let mut input_map = InputMap::new([
        (KeyCode::W, Actions::Forward),
        (KeyCode::S, Actions::Backwards),
        (KeyCode::A, Actions::StrafeLeft),
        (KeyCode::D, Actions::StrafeRight),
        (KeyCode::LShift, Actions::Sprint),
        (KeyCode::Space, Actions::Jump),
        (KeyCode::E, Actions::Grab),
    ]);
    input_map.insert(MouseButton::Left, Actions::FirePortalA);
    input_map.insert(MouseButton::Right, Actions::FirePortalB);
    input_map.insert(MouseButton::Middle, Actions::Zoom);
    input_map.insert(DualAxis::mouse_motion(), Actions::Aim);
    input_map
}

fn set_cursor_captured(window: &mut Window, captured: bool) {
    window.set_cursor_visibility(!captured);
    window.set_cursor_grab_mode(if captured {
        CursorGrabMode::Locked
    } else {
        CursorGrabMode::None
    });
}

fn toggle_on_start(mut windows: ResMut<Windows>) {
    if let Some(window) = windows.get_primary_mut() {
        set_cursor_captured(window, true);
    }
}

/// Tab frees the mouse cursor, or captures it back.
fn toggle_mouse_capture(mut windows: ResMut<Windows>, keys: Res<Input<KeyCode>>) {
    if keys.just_pressed(KeyCode::Tab) {
        if let Some(window) = windows.get_primary_mut() {
            let captured = window.cursor_grab_mode() != CursorGrabMode::None;
            info!("{} mouse cursor", if captured { "Releasing" } else { "Capturing" });
            set_cursor_captured(window, !captured);
        }
    }
}
