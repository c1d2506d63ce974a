// Input state tracking for keyboard and mouse
// Abstracts winit events into a queryable per-frame snapshot

use std::collections::HashSet;
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Default)]
pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,

    // Mouse buttons currently down
    buttons_held: HashSet<MouseButton>,

    // Raw mouse motion accumulated this frame, reset in end_frame().
    // Taken from DeviceEvent so it keeps working while the cursor is grabbed.
    pub mouse_delta: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the game's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.set_key(key, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => { self.buttons_held.insert(*button); }
                ElementState::Released => { self.buttons_held.remove(button); }
            },
            WindowEvent::Focused(false) => {
                // Releases are not delivered to an unfocused window.
                self.keys_held.clear();
                self.buttons_held.clear();
            }
            _ => {}
        }
    }

    /// Feed a winit DeviceEvent (raw mouse motion).
    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_delta.0 += delta.0 as f32;
            self.mouse_delta.1 += delta.1 as f32;
        }
    }

    /// Call once per frame after update() and render() have consumed input.
    /// Resets per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }
}
