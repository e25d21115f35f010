use std::time::Instant;

use sdl2::EventPump;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;

use crate::geometry::{SCREEN_HEIGHT, SCREEN_WIDTH, Vector2};

/// Discrete keyboard actions the GUI reacts to
///
/// Raw keys are translated once here so widgets never see SDL keycodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
    Backspace,
    Delete,
    Home,
    End,
}

/// Everything the GUI needs to know about input for one frame
///
/// This is a plain value: it is built by [`SdlInput::poll`] in the game and by
/// hand in tests, then handed to `Imgui::begin`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer position in logical screen coordinates
    pub pointer: Vector2,
    /// Left button was released this frame
    pub clicked: bool,
    /// Left button is currently down
    pub pointer_held: bool,
    /// The release completed a double click
    pub double_clicked: bool,
    pub wheel_up: bool,
    pub wheel_down: bool,
    /// First key action of the frame, if any
    pub key_action: Option<KeyAction>,
    /// Text typed this frame
    pub text: Option<String>,
    /// Milliseconds since startup
    pub ticks_ms: u64,
    pub quit: bool,
}

impl FrameInput {
    /// Records a key action. Only the first action of a frame counts; later
    /// key presses in the same frame are dropped.
    pub fn push_key(&mut self, action: Option<KeyAction>) {
        if self.key_action.is_none() {
            self.key_action = action;
        }
    }

    /// Input with the pointer resting at (x, y) and nothing else happening
    #[cfg(test)]
    pub fn at(x: f32, y: f32) -> Self {
        FrameInput {
            pointer: Vector2::new(x, y),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn with_click(mut self) -> Self {
        self.clicked = true;
        self
    }

    #[cfg(test)]
    pub fn with_key(mut self, action: KeyAction) -> Self {
        self.key_action = Some(action);
        self
    }

    #[cfg(test)]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }
}

/// Translates a keycode into a GUI action
pub fn key_action(key: Keycode) -> Option<KeyAction> {
    match key {
        Keycode::Up => Some(KeyAction::Up),
        Keycode::Down => Some(KeyAction::Down),
        Keycode::Left => Some(KeyAction::Left),
        Keycode::Right => Some(KeyAction::Right),
        Keycode::Return | Keycode::KpEnter | Keycode::Space => Some(KeyAction::Select),
        Keycode::Escape => Some(KeyAction::Back),
        Keycode::Backspace => Some(KeyAction::Backspace),
        Keycode::Delete => Some(KeyAction::Delete),
        Keycode::Home => Some(KeyAction::Home),
        Keycode::End => Some(KeyAction::End),
        _ => None,
    }
}

/// Maps a window pixel position onto the 800x600 logical screen
pub fn to_logical(x: i32, y: i32, window_size: (u32, u32)) -> Vector2 {
    let (width, height) = window_size;
    if width == 0 || height == 0 {
        return Vector2::new(x as f32, y as f32);
    }
    Vector2::new(
        x as f32 * SCREEN_WIDTH as f32 / width as f32,
        y as f32 * SCREEN_HEIGHT as f32 / height as f32,
    )
}

/// Polls SDL2 events and condenses them into a [`FrameInput`] per frame
pub struct SdlInput {
    event_pump: EventPump,
    pointer: Vector2,
    held: bool,
    started: Instant,
    window_size: (u32, u32),
    /// Whether window coordinates still need scaling to logical coordinates
    scale_pointer: bool,
}

impl SdlInput {
    pub fn new(event_pump: EventPump, window_size: (u32, u32)) -> Self {
        SdlInput {
            event_pump,
            pointer: Vector2::ZERO,
            held: false,
            started: Instant::now(),
            window_size,
            scale_pointer: false,
        }
    }

    /// The SDL canvas already reports logical coordinates; the GL window does not
    pub fn set_pointer_scaling(&mut self, enabled: bool) {
        self.scale_pointer = enabled;
    }

    /// Drains pending events and returns this frame's input
    pub fn poll(&mut self) -> FrameInput {
        let mut frame = FrameInput::default();

        let events: Vec<Event> = self.event_pump.poll_iter().collect();
        for event in events {
            match event {
                Event::Quit { .. } => {
                    frame.quit = true;
                }
                Event::Window {
                    win_event: WindowEvent::SizeChanged(w, h),
                    ..
                } => {
                    self.window_size = (w.max(0) as u32, h.max(0) as u32);
                }
                Event::KeyDown {
                    keycode: Some(key), ..
                } => {
                    frame.push_key(key_action(key));
                }
                Event::TextInput { text, .. } => {
                    frame.text.get_or_insert_with(String::new).push_str(&text);
                }
                Event::MouseMotion { x, y, .. } => {
                    self.pointer = self.logical(x, y);
                }
                Event::MouseButtonDown {
                    mouse_btn: MouseButton::Left,
                    x,
                    y,
                    ..
                } => {
                    self.pointer = self.logical(x, y);
                    self.held = true;
                }
                Event::MouseButtonUp {
                    mouse_btn: MouseButton::Left,
                    clicks,
                    x,
                    y,
                    ..
                } => {
                    self.pointer = self.logical(x, y);
                    self.held = false;
                    frame.clicked = true;
                    if clicks >= 2 {
                        frame.double_clicked = true;
                    }
                }
                Event::MouseWheel { y, .. } => {
                    if y > 0 {
                        frame.wheel_up = true;
                    } else if y < 0 {
                        frame.wheel_down = true;
                    }
                }
                _ => {}
            }
        }

        frame.pointer = self.pointer;
        frame.pointer_held = self.held;
        frame.ticks_ms = self.started.elapsed().as_millis() as u64;
        frame
    }

    fn logical(&self, x: i32, y: i32) -> Vector2 {
        if self.scale_pointer {
            to_logical(x, y, self.window_size)
        } else {
            Vector2::new(x as f32, y as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_action(Keycode::Up), Some(KeyAction::Up));
        assert_eq!(key_action(Keycode::Return), Some(KeyAction::Select));
        assert_eq!(key_action(Keycode::Space), Some(KeyAction::Select));
        assert_eq!(key_action(Keycode::Escape), Some(KeyAction::Back));
        assert_eq!(key_action(Keycode::Backspace), Some(KeyAction::Backspace));
        assert_eq!(key_action(Keycode::A), None);
    }

    #[test]
    fn test_to_logical_scales_window() {
        assert_eq!(to_logical(800, 600, (1600, 1200)), Vector2::new(400.0, 300.0));
        assert_eq!(to_logical(100, 50, (800, 600)), Vector2::new(100.0, 50.0));
        // Degenerate window sizes pass coordinates through
        assert_eq!(to_logical(7, 9, (0, 0)), Vector2::new(7.0, 9.0));
    }

    #[test]
    fn test_first_key_action_wins() {
        let mut frame = FrameInput::default();
        frame.push_key(None);
        frame.push_key(Some(KeyAction::Down));
        frame.push_key(Some(KeyAction::Select));
        assert_eq!(frame.key_action, Some(KeyAction::Down));
    }

    #[test]
    fn test_frame_input_builders() {
        let input = FrameInput::at(10.0, 20.0)
            .with_click()
            .with_key(KeyAction::Down)
            .with_text("x");
        assert_eq!(input.pointer, Vector2::new(10.0, 20.0));
        assert!(input.clicked);
        assert_eq!(input.key_action, Some(KeyAction::Down));
        assert_eq!(input.text.as_deref(), Some("x"));
        assert!(!input.quit);
    }
}
