use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

/// Turns pointer input into orbit camera motion
///
/// Left drag rotates, shift + left drag pans, the wheel zooms.
pub struct CameraController {
    /// Radians per pixel of drag
    pub rotate_speed: f32,
    /// Zoom factor per wheel line
    pub zoom_speed: f32,
    /// Fraction of the orbit distance per pixel of drag
    pub pan_speed: f32,
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(0.005, 0.95)
    }
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.001,
            is_shift_held: false,
            is_mouse_pressed: false,
        }
    }

    /// Raw mouse motion, used while a drag is in progress
    pub fn process_device_event(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if !self.is_mouse_pressed {
                return;
            }
            let (dx, dy) = (delta.0 as f32, delta.1 as f32);
            if self.is_shift_held {
                // SHIFT + DRAG = PAN (move focus point)
                camera.pan((-dx * self.pan_speed, dy * self.pan_speed));
            } else {
                // NORMAL DRAG = ROTATE (orbit around focus)
                camera.rotate_left(dx * self.rotate_speed);
                camera.rotate_up(dy * self.rotate_speed);
            }
        }
    }

    pub fn process_window_event(&mut self, event: &WindowEvent, camera: &mut OrbitCamera) {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32 / 40.0
                    }
                };
                // Scrolling up moves closer
                camera.zoom(self.zoom_speed.powf(lines));
            }
            WindowEvent::KeyboardInput { event, .. } => self.process_keyed_event(event),
            WindowEvent::Focused(false) => {
                self.is_mouse_pressed = false;
                self.is_shift_held = false;
            }
            _ => (),
        }
    }

    fn process_keyed_event(&mut self, event: &KeyEvent) {
        if let KeyEvent {
            physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
            state,
            ..
        } = event
        {
            let was_shift_held = self.is_shift_held;
            self.is_shift_held = *state == ElementState::Pressed;
            if was_shift_held != self.is_shift_held {
                log::trace!("Shift state changed: {}", self.is_shift_held);
            }
        }
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_mouse_pressed && self.is_shift_held
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_mouse_pressed && !self.is_shift_held
    }
}
