//! Immediate-mode widgets
//!
//! Each `do_*` call both handles input for its widget and queues what to
//! draw. Nothing is retained between frames except the [`WidgetState`]
//! bookkeeping, so a widget exists exactly as long as the code calling it.

use log::warn;

use crate::assets::{ARROW_DOWN_FILE, ARROW_UP_FILE, CURSOR_FILE, SCROLLBAR_FILE};
use crate::color::Color;
use crate::font::{TextFlags, aligned_origin, glyph_size, text_width};
use crate::geometry::{BLOB_HEIGHT, BLOB_WIDTH, ScreenRect, Vector2};
use crate::input::{FrameInput, KeyAction};
use crate::render::RenderBackend;
use crate::text_manager::{StringId, TextManager};

use super::queue::{DrawCommand, RenderQueue};
use super::state::{WidgetId, WidgetState};

/// Ids handed out by [`Imgui::next_id`] start here, above hand-picked ids
pub const AUTO_ID_BASE: WidgetId = 1000;

pub const DEFAULT_OVERLAY_OPACITY: f32 = 0.65;

const SCROLLBAR_WIDTH: f32 = 210.0;
const SCROLLBAR_HEIGHT: f32 = 26.0;
const SCROLLBAR_TRACK: f32 = 200.0;
const SCROLLBAR_STEP: f32 = 0.1;

const CURSOR_OFFSET: Vector2 = Vector2::new(24.0, 24.0);
const CURSOR_BLINK_MS: u64 = 1000;

const ARROW_KEYS: [KeyAction; 2] = [KeyAction::Left, KeyAction::Right];
const EDIT_KEYS: [KeyAction; 6] = [
    KeyAction::Left,
    KeyAction::Right,
    KeyAction::Home,
    KeyAction::End,
    KeyAction::Backspace,
    KeyAction::Delete,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectBoxAction {
    None,
    Select,
    DoubleClick,
}

pub struct Imgui {
    state: WidgetState,
    queue: RenderQueue,
    text: TextManager,
    input: FrameInput,
    previous_pointer: Vector2,
    draw_cursor: bool,
    using_cursor: bool,
    id_counter: WidgetId,
}

impl Imgui {
    pub fn new(text: TextManager) -> Self {
        Imgui {
            state: WidgetState::new(),
            queue: RenderQueue::new(),
            text,
            input: FrameInput::default(),
            previous_pointer: Vector2::ZERO,
            draw_cursor: false,
            using_cursor: false,
            id_counter: AUTO_ID_BASE,
        }
    }

    /// Starts a GUI frame with this frame's input
    pub fn begin(&mut self, input: FrameInput) {
        if input.pointer != self.previous_pointer || input.clicked || input.pointer_held {
            self.using_cursor = true;
        } else if input.key_action.is_some() {
            self.using_cursor = false;
        }
        self.previous_pointer = input.pointer;

        self.state.begin(input.key_action, input.pointer_held);
        if !self.queue.is_empty() {
            warn!("GUI frame started with {} undrawn commands", self.queue.len());
            self.queue = RenderQueue::new();
        }
        self.draw_cursor = false;
        self.id_counter = AUTO_ID_BASE;
        self.input = input;
    }

    /// Draws everything queued this frame, then the pointer cursor
    pub fn end(&mut self, backend: &mut dyn RenderBackend) -> Result<(), String> {
        let drawn = self.queue.flush(backend);
        if self.draw_cursor {
            backend.draw_image(CURSOR_FILE, self.input.pointer + CURSOR_OFFSET, Vector2::ZERO)?;
        }
        drawn
    }

    /// Clears keyboard focus, e.g. when switching screens
    pub fn reset_selection(&mut self) {
        self.state.reset_selection();
    }

    pub fn set_inactive(&mut self, inactive: bool) {
        self.state.set_inactive(inactive);
    }

    /// A fresh id, stable across frames as long as widgets are called in the
    /// same order
    pub fn next_id(&mut self) -> WidgetId {
        self.id_counter += 1;
        self.id_counter
    }

    /// Whether the pointer, rather than the keyboard, was used last. Callers
    /// pass this to [`Imgui::do_cursor`] to hide the cursor while navigating
    /// by keyboard.
    pub fn using_cursor(&self) -> bool {
        self.using_cursor
    }

    pub fn text(&self) -> &TextManager {
        &self.text
    }

    /// Switches language; widgets drawn from now on use the new strings
    pub fn set_text_manager(&mut self, text: TextManager) {
        self.text = text;
    }

    #[cfg(test)]
    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn duplicate_ids(&self) -> u32 {
        self.state.duplicate_ids()
    }

    pub fn do_image(&mut self, id: WidgetId, position: Vector2, name: &str, size: Vector2) {
        self.state.register(id);
        self.queue.push(DrawCommand::Image {
            name: name.to_string(),
            position,
            size,
        });
    }

    pub fn do_text(&mut self, id: WidgetId, position: Vector2, text: &str, flags: TextFlags) {
        self.state.register(id);
        self.push_text(text, position, flags);
    }

    pub fn do_text_id(&mut self, id: WidgetId, position: Vector2, text: StringId, flags: TextFlags) {
        let text = self.text.get(text).to_string();
        self.do_text(id, position, &text, flags);
    }

    pub fn do_overlay(
        &mut self,
        id: WidgetId,
        top_left: Vector2,
        bottom_right: Vector2,
        color: Color,
        opacity: f32,
    ) {
        self.state.register(id);
        self.push_overlay(opacity, top_left, bottom_right, color);
    }

    /// Requests the pointer cursor for this frame
    pub fn do_cursor(&mut self, draw: bool) {
        self.draw_cursor = draw;
    }

    pub fn do_button(&mut self, id: WidgetId, position: Vector2, text: &str, flags: TextFlags) -> bool {
        self.state.register(id);
        let origin = aligned_origin(text, position, flags);
        let bounds = ScreenRect::new(
            origin.x.round() as i32,
            origin.y.round() as i32,
            text_width(text, flags),
            glyph_size(flags),
        );

        let hot = self.state.hover(id, bounds.contains(self.input.pointer));
        let navigation = self.state.navigate(id);
        let clicked = self.state.pointer_trigger(id, hot, self.input.clicked)
            || self.state.trigger(id, navigation.confirmed);

        let flags = if hot || navigation.focused {
            flags | TextFlags::HIGHLIGHT
        } else {
            flags
        };
        self.push_text(text, position, flags);
        clicked
    }

    pub fn do_button_id(&mut self, id: WidgetId, position: Vector2, text: StringId, flags: TextFlags) -> bool {
        let text = self.text.get(text).to_string();
        self.do_button(id, position, &text, flags)
    }

    /// Image centered on `position` that reacts to clicks. Not reachable by
    /// keyboard.
    pub fn do_image_button(&mut self, id: WidgetId, position: Vector2, size: Vector2, image: &str) -> bool {
        self.state.register(id);
        let bounds = ScreenRect::centered(position, size.x.max(0.0) as u32, size.y.max(0.0) as u32);
        let hot = self.state.hover(id, bounds.contains(self.input.pointer));
        let clicked = self.state.pointer_trigger(id, hot, self.input.clicked);
        self.queue.push(DrawCommand::Image {
            name: image.to_string(),
            position,
            size,
        });
        clicked
    }

    /// Horizontal slider for `value` in [0, 1].
    ///
    /// Returns true when keyboard focus leaves the bar, which menus use to
    /// commit the value.
    pub fn do_scrollbar(&mut self, id: WidgetId, position: Vector2, value: &mut f32) -> bool {
        self.state.register(id);
        let pointer = self.input.pointer;
        let inside = pointer.x + 5.0 > position.x
            && pointer.y > position.y
            && pointer.x < position.x + SCROLLBAR_TRACK + 5.0
            && pointer.y < position.y + SCROLLBAR_HEIGHT - 2.0;
        let hot = self.state.hover(id, inside);
        let navigation = self.state.navigate(id);

        match self.state.take_key(id, &ARROW_KEYS) {
            Some(KeyAction::Left) => *value -= SCROLLBAR_STEP,
            Some(KeyAction::Right) => *value += SCROLLBAR_STEP,
            _ => {}
        }
        if hot && !self.state.is_inactive() {
            if self.input.wheel_up {
                *value += SCROLLBAR_STEP;
            }
            if self.input.wheel_down {
                *value -= SCROLLBAR_STEP;
            }
        }
        if self.state.hold(id, hot, self.input.pointer_held) {
            *value = (pointer.x - position.x) / SCROLLBAR_TRACK;
        }
        *value = value.clamp(0.0, 1.0);

        let opacity = if navigation.focused { 0.4 } else { 0.5 };
        self.push_overlay(
            opacity,
            position,
            position + Vector2::new(SCROLLBAR_WIDTH, SCROLLBAR_HEIGHT),
            Color::BLACK,
        );
        self.queue.push(DrawCommand::Image {
            name: SCROLLBAR_FILE.to_string(),
            position: position + Vector2::new(*value * SCROLLBAR_TRACK + 5.0, SCROLLBAR_HEIGHT / 2.0),
            size: Vector2::ZERO,
        });
        navigation.left
    }

    /// Single-line text field holding at most `length` characters.
    ///
    /// `cursor` is a character index into `text`. With `force_active` the box
    /// takes keyboard focus every frame. Returns whether `text` changed.
    #[allow(clippy::too_many_arguments)]
    pub fn do_editbox(
        &mut self,
        id: WidgetId,
        position: Vector2,
        length: usize,
        text: &mut String,
        cursor: &mut usize,
        flags: TextFlags,
        force_active: bool,
    ) -> bool {
        self.state.register(id);
        let glyph = glyph_size(flags) as f32;
        let size = Vector2::new(10.0 + length as f32 * glyph, 10.0 + glyph);
        let bounds = ScreenRect::spanning(position, position + size);
        let hot = self.state.hover(id, bounds.contains(self.input.pointer));
        if force_active && !self.state.is_inactive() {
            self.state.set_focus(id);
        }
        self.state.navigate(id);

        let mut changed = false;
        let mut chars = text.chars().count();
        *cursor = (*cursor).min(chars);

        if self.state.pointer_trigger(id, hot, self.input.clicked) {
            self.state.set_focus(id);
            let offset = self.input.pointer.x - position.x - 5.0;
            *cursor = if offset < chars as f32 * glyph {
                (((offset + glyph / 2.0) / glyph).max(0.0) as usize).min(chars)
            } else {
                chars
            };
        }

        let focused = self.state.focused() == Some(id) && !self.state.is_inactive();
        if focused {
            match self.state.take_key(id, &EDIT_KEYS) {
                Some(KeyAction::Left) => *cursor = cursor.saturating_sub(1),
                Some(KeyAction::Right) => *cursor = (*cursor + 1).min(chars),
                Some(KeyAction::Home) => *cursor = 0,
                Some(KeyAction::End) => *cursor = chars,
                Some(KeyAction::Backspace) if *cursor > 0 => {
                    *cursor -= 1;
                    text.remove(byte_offset(text, *cursor));
                    chars -= 1;
                    changed = true;
                }
                Some(KeyAction::Delete) if *cursor < chars => {
                    text.remove(byte_offset(text, *cursor));
                    chars -= 1;
                    changed = true;
                }
                _ => {}
            }

            if let Some(typed) = self.input.text.take() {
                for c in typed.chars() {
                    if chars >= length {
                        break;
                    }
                    text.insert(byte_offset(text, *cursor), c);
                    *cursor += 1;
                    chars += 1;
                    changed = true;
                }
            }
        }

        let opacity = if focused { 0.3 } else { 0.5 };
        self.push_overlay(opacity, position, position + size, Color::BLACK);
        let text_flags = if focused { flags | TextFlags::HIGHLIGHT } else { flags };
        self.push_text(text, position + Vector2::new(5.0, 5.0), text_flags);

        if focused && self.input.ticks_ms % CURSOR_BLINK_MS < CURSOR_BLINK_MS / 2 {
            let top_left = Vector2::new(*cursor as f32 * glyph + position.x + 5.0, position.y + 5.0);
            self.push_overlay(1.0, top_left, top_left + Vector2::new(3.0, glyph), Color::WHITE);
        }
        changed
    }

    /// Paged list with up/down arrows
    pub fn do_selectbox(
        &mut self,
        id: WidgetId,
        top_left: Vector2,
        bottom_right: Vector2,
        entries: &[String],
        selected: &mut usize,
        flags: TextFlags,
    ) -> SelectBoxAction {
        self.state.register(id);
        let glyph = glyph_size(flags) as f32;
        let per_page = items_per_page(top_left, bottom_right, glyph);
        let pointer = self.input.pointer;
        let hot = self
            .state
            .hover(id, ScreenRect::spanning(top_left, bottom_right).contains(pointer));
        let navigation = self.state.navigate(id);

        let mut action = SelectBoxAction::None;
        if let Some(last) = entries.len().checked_sub(1) {
            *selected = (*selected).min(last);

            match self.state.take_key(id, &ARROW_KEYS) {
                Some(KeyAction::Left) if *selected > 0 => {
                    *selected -= 1;
                    action = SelectBoxAction::Select;
                }
                Some(KeyAction::Right) if *selected < last => {
                    *selected += 1;
                    action = SelectBoxAction::Select;
                }
                _ => {}
            }
            if self.state.trigger(id, navigation.confirmed) {
                action = SelectBoxAction::DoubleClick;
            }

            if hot && !self.state.is_inactive() {
                if self.input.wheel_up && *selected > 0 {
                    *selected -= 1;
                    action = SelectBoxAction::Select;
                }
                if self.input.wheel_down && *selected < last {
                    *selected += 1;
                    action = SelectBoxAction::Select;
                }
            }

            if self.state.pointer_trigger(id, hot, self.input.clicked) {
                self.state.set_focus(id);
                let first = first_on_page(*selected, per_page);
                if pointer.x > top_left.x
                    && pointer.y > top_left.y + 5.0
                    && pointer.x < bottom_right.x - 35.0
                    && pointer.y < top_left.y + 5.0 + glyph * per_page as f32
                {
                    let item = ((pointer.y - top_left.y - 5.0) / glyph) as usize + first;
                    if item <= last {
                        if self.input.double_clicked && item == *selected {
                            action = SelectBoxAction::DoubleClick;
                        } else {
                            *selected = item;
                            action = SelectBoxAction::Select;
                        }
                    }
                } else if pointer.x > bottom_right.x - 30.0 && pointer.x < bottom_right.x - 6.0 {
                    if pointer.y > top_left.y + 3.0 && pointer.y < top_left.y + 27.0 && *selected > 0 {
                        *selected -= 1;
                        action = SelectBoxAction::Select;
                    } else if pointer.y > bottom_right.y - 27.0
                        && pointer.y < bottom_right.y - 3.0
                        && *selected < last
                    {
                        *selected += 1;
                        action = SelectBoxAction::Select;
                    }
                }
            }
        }

        let opacity = if navigation.focused { 0.3 } else { 0.5 };
        self.push_overlay(opacity, top_left, bottom_right, Color::BLACK);
        self.queue.push(DrawCommand::Image {
            name: ARROW_UP_FILE.to_string(),
            position: Vector2::new(bottom_right.x - 15.0, top_left.y + 15.0),
            size: Vector2::ZERO,
        });
        self.queue.push(DrawCommand::Image {
            name: ARROW_DOWN_FILE.to_string(),
            position: Vector2::new(bottom_right.x - 15.0, bottom_right.y - 15.0),
            size: Vector2::ZERO,
        });

        let first = first_on_page(*selected, per_page);
        for (row, (index, entry)) in entries.iter().enumerate().skip(first).take(per_page).enumerate() {
            let entry_flags = if index == *selected {
                flags | TextFlags::HIGHLIGHT
            } else {
                flags
            };
            let position = Vector2::new(top_left.x + 5.0, top_left.y + row as f32 * glyph + 5.0);
            self.push_text(entry, position, entry_flags);
        }
        action
    }

    /// Scrolling chat log showing the page that ends at `selected`.
    ///
    /// `local[i]` marks lines written by the local player; those are
    /// highlighted. Both slices must have the same length.
    #[allow(clippy::too_many_arguments)]
    pub fn do_chatbox(
        &mut self,
        id: WidgetId,
        top_left: Vector2,
        bottom_right: Vector2,
        entries: &[String],
        selected: &mut usize,
        local: &[bool],
        flags: TextFlags,
    ) {
        self.state.register(id);
        if entries.len() != local.len() {
            warn!(
                "Chat box {} got {} lines but {} local flags, not drawn",
                id,
                entries.len(),
                local.len()
            );
            return;
        }

        let glyph = glyph_size(flags) as f32;
        let per_page = items_per_page(top_left, bottom_right, glyph);
        let hot = self
            .state
            .hover(id, ScreenRect::spanning(top_left, bottom_right).contains(self.input.pointer));
        let navigation = self.state.navigate(id);

        if let Some(last) = entries.len().checked_sub(1) {
            *selected = (*selected).min(last);
            match self.state.take_key(id, &ARROW_KEYS) {
                Some(KeyAction::Left) => *selected = selected.saturating_sub(1),
                Some(KeyAction::Right) => *selected = (*selected + 1).min(last),
                _ => {}
            }
            if hot && !self.state.is_inactive() {
                if self.input.wheel_up {
                    *selected = selected.saturating_sub(1);
                }
                if self.input.wheel_down {
                    *selected = (*selected + 1).min(last);
                }
            }
        }

        let opacity = if navigation.focused { 0.3 } else { 0.5 };
        self.push_overlay(opacity, top_left, bottom_right, Color::BLACK);

        if entries.is_empty() {
            return;
        }
        let end = *selected + 1;
        let first = end.saturating_sub(per_page);
        for (row, index) in (first..end).enumerate() {
            let line_flags = if local[index] {
                flags | TextFlags::HIGHLIGHT
            } else {
                flags
            };
            let position = Vector2::new(top_left.x + 5.0, top_left.y + row as f32 * glyph + 5.0);
            self.push_text(&entries[index], position, line_flags);
        }
    }

    /// Tinted blob preview; returns true when clicked
    pub fn do_blob(&mut self, id: WidgetId, position: Vector2, color: Color) -> bool {
        self.state.register(id);
        let bounds = ScreenRect::centered(position, BLOB_WIDTH, BLOB_HEIGHT);
        let hot = self.state.hover(id, bounds.contains(self.input.pointer));
        let clicked = self.state.pointer_trigger(id, hot, self.input.clicked);
        self.queue.push(DrawCommand::Blob { position, color });
        clicked
    }

    fn push_text(&mut self, text: &str, position: Vector2, flags: TextFlags) {
        self.queue.push(DrawCommand::Text {
            text: text.to_string(),
            position,
            flags,
        });
    }

    fn push_overlay(&mut self, opacity: f32, top_left: Vector2, bottom_right: Vector2, color: Color) {
        self.queue.push(DrawCommand::Overlay {
            opacity,
            top_left,
            bottom_right,
            color,
        });
    }
}

fn items_per_page(top_left: Vector2, bottom_right: Vector2, glyph: f32) -> usize {
    (((bottom_right.y - top_left.y - 10.0) / glyph).max(1.0)) as usize
}

fn first_on_page(selected: usize, per_page: usize) -> usize {
    (selected / per_page) * per_page
}

/// Byte offset of the `index`-th character, or the end of the string
fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices().nth(index).map_or(text.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::{Call, RecordingBackend};

    fn frame<R>(gui: &mut Imgui, input: FrameInput, widgets: impl FnOnce(&mut Imgui) -> R) -> (R, RecordingBackend) {
        gui.begin(input);
        let result = widgets(gui);
        let mut backend = RecordingBackend::default();
        gui.end(&mut backend).unwrap();
        (result, backend)
    }

    fn gui() -> Imgui {
        Imgui::new(TextManager::english())
    }

    fn entries(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_button_click_fires_once() {
        let mut gui = gui();
        let pos = Vector2::new(100.0, 100.0);
        let at = FrameInput::at(110.0, 110.0);

        let (clicked, backend) = frame(&mut gui, at.clone(), |g| g.do_button(1, pos, "start", TextFlags::NORMAL));
        assert!(!clicked);
        assert_eq!(
            backend.calls,
            vec![Call::Text("start".to_string(), pos, TextFlags::HIGHLIGHT)]
        );

        let (clicked, _) = frame(&mut gui, at.clone().with_click(), |g| {
            g.do_button(1, pos, "start", TextFlags::NORMAL)
        });
        assert!(clicked);
        assert_eq!(gui.state().active(), Some(1));

        let (clicked, _) = frame(&mut gui, at, |g| g.do_button(1, pos, "start", TextFlags::NORMAL));
        assert!(!clicked);
        assert_eq!(gui.state().active(), None);
    }

    #[test]
    fn test_button_outside_not_highlighted() {
        let mut gui = gui();
        let (_, backend) = frame(&mut gui, FrameInput::at(0.0, 0.0), |g| {
            g.do_button(1, Vector2::new(100.0, 100.0), "exit", TextFlags::NORMAL)
        });
        assert_eq!(
            backend.calls,
            vec![Call::Text("exit".to_string(), Vector2::new(100.0, 100.0), TextFlags::NORMAL)]
        );
    }

    #[test]
    fn test_centered_button_bounds() {
        let mut gui = gui();
        let pos = Vector2::new(400.0, 100.0);
        // "ab" centered at 400 spans 376..424
        let at = FrameInput::at(380.0, 110.0);
        frame(&mut gui, at.clone(), |g| g.do_button(1, pos, "ab", TextFlags::ALIGN_CENTER));
        let (clicked, _) = frame(&mut gui, at.with_click(), |g| {
            g.do_button(1, pos, "ab", TextFlags::ALIGN_CENTER)
        });
        assert!(clicked);
    }

    #[test]
    fn test_keyboard_selects_second_button() {
        let mut gui = gui();
        let buttons = |g: &mut Imgui| {
            let a = g.do_button(1, Vector2::new(100.0, 100.0), "one", TextFlags::NORMAL);
            let b = g.do_button(2, Vector2::new(100.0, 150.0), "two", TextFlags::NORMAL);
            (a, b)
        };
        frame(&mut gui, FrameInput::default().with_key(KeyAction::Down), buttons);
        frame(&mut gui, FrameInput::default().with_key(KeyAction::Down), buttons);
        assert_eq!(gui.state().focused(), Some(2));

        let (result, backend) = frame(&mut gui, FrameInput::default().with_key(KeyAction::Select), buttons);
        assert_eq!(result, (false, true));
        assert_eq!(
            backend.calls[1],
            Call::Text("two".to_string(), Vector2::new(100.0, 150.0), TextFlags::HIGHLIGHT)
        );
        assert!(!gui.using_cursor());
    }

    #[test]
    fn test_button_id_uses_text_manager() {
        let mut gui = gui();
        let (_, backend) = frame(&mut gui, FrameInput::default(), |g| {
            g.do_button_id(1, Vector2::ZERO, StringId::MenuQuit, TextFlags::NORMAL);
            g.do_text_id(2, Vector2::ZERO, StringId::MenuStart, TextFlags::NORMAL);
        });
        assert_eq!(backend.texts(), vec!["exit", "start"]);
    }

    #[test]
    fn test_language_switch_between_frames() {
        let mut gui = gui();
        let quit = |g: &mut Imgui| g.do_button_id(1, Vector2::ZERO, StringId::MenuQuit, TextFlags::NORMAL);
        frame(&mut gui, FrameInput::default(), quit);

        let german = TextManager::from_json("de", r#"{ "MenuQuit": "beenden" }"#).unwrap();
        gui.set_text_manager(german);
        let (_, backend) = frame(&mut gui, FrameInput::default(), quit);
        assert_eq!(gui.text().language(), "de");
        assert_eq!(backend.texts(), vec!["beenden"]);
    }

    #[test]
    fn test_inactive_button_is_drawn_but_ignores_clicks() {
        let mut gui = gui();
        gui.set_inactive(true);
        let pos = Vector2::new(0.0, 0.0);
        let at = FrameInput::at(5.0, 5.0);
        frame(&mut gui, at.clone(), |g| g.do_button(1, pos, "ok", TextFlags::NORMAL));
        let (clicked, backend) = frame(&mut gui, at.with_click(), |g| g.do_button(1, pos, "ok", TextFlags::NORMAL));
        assert!(!clicked);
        assert_eq!(backend.texts(), vec!["ok"]);
    }

    #[test]
    fn test_image_button_centered() {
        let mut gui = gui();
        let pos = Vector2::new(200.0, 200.0);
        let size = Vector2::new(40.0, 40.0);
        let at = FrameInput::at(185.0, 215.0);
        frame(&mut gui, at.clone(), |g| g.do_image_button(1, pos, size, "gfx/pfeil_oben.bmp"));
        let (clicked, backend) = frame(&mut gui, at.with_click(), |g| {
            g.do_image_button(1, pos, size, "gfx/pfeil_oben.bmp")
        });
        assert!(clicked);
        assert_eq!(backend.images(), vec!["gfx/pfeil_oben.bmp"]);
    }

    #[test]
    fn test_scrollbar_keys_and_drag() {
        let mut gui = gui();
        let pos = Vector2::new(100.0, 100.0);
        let mut value = 0.5;

        frame(&mut gui, FrameInput::default().with_key(KeyAction::Down), |g| {
            g.do_scrollbar(1, pos, &mut value)
        });
        frame(&mut gui, FrameInput::default().with_key(KeyAction::Right), |g| {
            g.do_scrollbar(1, pos, &mut value)
        });
        assert!((value - 0.6).abs() < 1e-5);

        let mut held = FrameInput::at(200.0, 110.0);
        held.pointer_held = true;
        frame(&mut gui, held, |g| g.do_scrollbar(1, pos, &mut value));
        assert!((value - 0.5).abs() < 1e-5);

        // Dragging past the end keeps the grab and clamps
        let mut held = FrameInput::at(400.0, 300.0);
        held.pointer_held = true;
        let (_, backend) = frame(&mut gui, held, |g| g.do_scrollbar(1, pos, &mut value));
        assert_eq!(value, 1.0);
        assert_eq!(
            backend.calls[1],
            Call::Image(SCROLLBAR_FILE.to_string(), Vector2::new(305.0, 113.0), Vector2::ZERO)
        );
    }

    #[test]
    fn test_scrollbar_reports_focus_leaving() {
        let mut gui = gui();
        let pos = Vector2::new(100.0, 100.0);
        let mut value = 0.0;
        frame(&mut gui, FrameInput::default().with_key(KeyAction::Down), |g| {
            g.do_scrollbar(1, pos, &mut value)
        });
        let (left, _) = frame(&mut gui, FrameInput::default().with_key(KeyAction::Down), |g| {
            g.do_scrollbar(1, pos, &mut value)
        });
        assert!(left);
    }

    #[test]
    fn test_editbox_typing_and_editing() {
        let mut gui = gui();
        let pos = Vector2::new(100.0, 100.0);
        let mut text = String::new();
        let mut cursor = 0;
        let at = FrameInput::at(110.0, 110.0);
        let edit = |g: &mut Imgui, input: FrameInput, text: &mut String, cursor: &mut usize| {
            frame(g, input, |g| g.do_editbox(1, pos, 4, text, cursor, TextFlags::NORMAL, false)).0
        };

        assert!(!edit(&mut gui, at.clone(), &mut text, &mut cursor));
        assert!(!edit(&mut gui, at.clone().with_click(), &mut text, &mut cursor));
        assert_eq!(gui.state().focused(), Some(1));

        assert!(edit(&mut gui, at.clone().with_text("abcdef"), &mut text, &mut cursor));
        assert_eq!(text, "abcd");
        assert_eq!(cursor, 4);

        assert!(edit(&mut gui, at.clone().with_key(KeyAction::Backspace), &mut text, &mut cursor));
        assert_eq!(text, "abc");
        assert_eq!(cursor, 3);

        assert!(!edit(&mut gui, at.clone().with_key(KeyAction::Home), &mut text, &mut cursor));
        assert_eq!(cursor, 0);
        assert!(edit(&mut gui, at.clone().with_key(KeyAction::Delete), &mut text, &mut cursor));
        assert_eq!(text, "bc");

        assert!(edit(&mut gui, at.clone().with_text("ä"), &mut text, &mut cursor));
        assert_eq!(text, "äbc");
        assert!(!edit(&mut gui, at.clone().with_key(KeyAction::End), &mut text, &mut cursor));
        assert_eq!(cursor, 3);

        // Click between the first and second glyph
        assert!(!edit(&mut gui, FrameInput::at(135.0, 110.0).with_click(), &mut text, &mut cursor));
        assert_eq!(cursor, 1);
    }

    #[test]
    fn test_editbox_ignores_text_without_focus() {
        let mut gui = gui();
        let mut text = "name".to_string();
        let mut cursor = 0;
        let (changed, backend) = frame(&mut gui, FrameInput::default().with_text("x"), |g| {
            g.do_editbox(1, Vector2::new(100.0, 100.0), 10, &mut text, &mut cursor, TextFlags::NORMAL, false)
        });
        assert!(!changed);
        assert_eq!(text, "name");
        assert_eq!(
            backend.calls,
            vec![
                Call::Overlay(0.5, Vector2::new(100.0, 100.0), Vector2::new(350.0, 134.0), Color::BLACK),
                Call::Text("name".to_string(), Vector2::new(105.0, 105.0), TextFlags::NORMAL),
            ]
        );
    }

    #[test]
    fn test_editbox_force_active_blinks_cursor() {
        let mut gui = gui();
        let mut text = "ab".to_string();
        let mut cursor = 2;
        let mut input = FrameInput::default();
        input.ticks_ms = 1200;
        let (_, backend) = frame(&mut gui, input.clone(), |g| {
            g.do_editbox(1, Vector2::new(100.0, 100.0), 10, &mut text, &mut cursor, TextFlags::NORMAL, true)
        });
        assert_eq!(
            backend.calls.last(),
            Some(&Call::Overlay(
                1.0,
                Vector2::new(153.0, 105.0),
                Vector2::new(156.0, 129.0),
                Color::WHITE
            ))
        );

        input.ticks_ms = 1700;
        let (_, backend) = frame(&mut gui, input, |g| {
            g.do_editbox(1, Vector2::new(100.0, 100.0), 10, &mut text, &mut cursor, TextFlags::NORMAL, true)
        });
        assert_eq!(backend.calls.len(), 2);
    }

    #[test]
    fn test_selectbox_click_and_double_click() {
        let mut gui = gui();
        let (p1, p2) = (Vector2::new(100.0, 100.0), Vector2::new(400.0, 200.0));
        let items = entries(&["one", "two", "three", "four", "five"]);
        let mut selected = 0;
        let at = FrameInput::at(150.0, 139.0);

        let (action, _) = frame(&mut gui, at.clone(), |g| {
            g.do_selectbox(1, p1, p2, &items, &mut selected, TextFlags::NORMAL)
        });
        assert_eq!(action, SelectBoxAction::None);

        let (action, backend) = frame(&mut gui, at.clone().with_click(), |g| {
            g.do_selectbox(1, p1, p2, &items, &mut selected, TextFlags::NORMAL)
        });
        assert_eq!(action, SelectBoxAction::Select);
        assert_eq!(selected, 1);
        assert_eq!(backend.texts(), vec!["one", "two", "three"]);

        let mut double = at.with_click();
        double.double_clicked = true;
        let (action, _) = frame(&mut gui, double, |g| {
            g.do_selectbox(1, p1, p2, &items, &mut selected, TextFlags::NORMAL)
        });
        assert_eq!(action, SelectBoxAction::DoubleClick);
        assert_eq!(selected, 1);
    }

    #[test]
    fn test_selectbox_pages_and_arrows() {
        let mut gui = gui();
        let (p1, p2) = (Vector2::new(100.0, 100.0), Vector2::new(400.0, 200.0));
        let items = entries(&["one", "two", "three", "four", "five"]);
        let mut selected = 2;
        // Down arrow area
        let at = FrameInput::at(380.0, 185.0);
        frame(&mut gui, at.clone(), |g| {
            g.do_selectbox(1, p1, p2, &items, &mut selected, TextFlags::NORMAL)
        });
        let (action, backend) = frame(&mut gui, at.with_click(), |g| {
            g.do_selectbox(1, p1, p2, &items, &mut selected, TextFlags::NORMAL)
        });
        assert_eq!(action, SelectBoxAction::Select);
        assert_eq!(selected, 3);
        assert_eq!(backend.images(), vec![ARROW_UP_FILE, ARROW_DOWN_FILE]);
        assert_eq!(backend.texts(), vec!["four", "five"]);
        assert!(backend.calls.contains(&Call::Text(
            "four".to_string(),
            Vector2::new(105.0, 105.0),
            TextFlags::HIGHLIGHT
        )));
    }

    #[test]
    fn test_selectbox_empty_is_safe() {
        let mut gui = gui();
        let mut selected = 3;
        let mut input = FrameInput::at(150.0, 150.0);
        input.wheel_down = true;
        let (action, _) = frame(&mut gui, input, |g| {
            g.do_selectbox(1, Vector2::new(100.0, 100.0), Vector2::new(400.0, 200.0), &[], &mut selected, TextFlags::NORMAL)
        });
        assert_eq!(action, SelectBoxAction::None);
    }

    #[test]
    fn test_chatbox_shows_page_ending_at_selected() {
        let mut gui = gui();
        let lines = entries(&["a", "b", "c", "d", "e", "f"]);
        let local = [false, false, false, false, true, false];
        let mut selected = 5;
        let (_, backend) = frame(&mut gui, FrameInput::default(), |g| {
            g.do_chatbox(
                1,
                Vector2::ZERO,
                Vector2::new(300.0, 82.0),
                &lines,
                &mut selected,
                &local,
                TextFlags::NORMAL,
            )
        });
        assert_eq!(backend.texts(), vec!["d", "e", "f"]);
        assert!(backend.calls.contains(&Call::Text(
            "e".to_string(),
            Vector2::new(5.0, 29.0),
            TextFlags::HIGHLIGHT
        )));

        selected = 1;
        let (_, backend) = frame(&mut gui, FrameInput::default(), |g| {
            g.do_chatbox(1, Vector2::ZERO, Vector2::new(300.0, 82.0), &lines, &mut selected, &local, TextFlags::NORMAL)
        });
        assert_eq!(backend.texts(), vec!["a", "b"]);
    }

    #[test]
    fn test_chatbox_rejects_mismatched_flags() {
        let mut gui = gui();
        let lines = entries(&["a", "b"]);
        let mut selected = 1;
        let (_, backend) = frame(&mut gui, FrameInput::default(), |g| {
            g.do_chatbox(1, Vector2::ZERO, Vector2::new(300.0, 82.0), &lines, &mut selected, &[true], TextFlags::NORMAL)
        });
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_blob_click() {
        let mut gui = gui();
        let pos = Vector2::new(200.0, 300.0);
        let color = Color::new(0, 0, 255);
        let at = FrameInput::at(230.0, 340.0);
        frame(&mut gui, at.clone(), |g| g.do_blob(1, pos, color));
        let (clicked, backend) = frame(&mut gui, at.with_click(), |g| g.do_blob(1, pos, color));
        assert!(clicked);
        assert_eq!(backend.calls, vec![Call::Blob(pos, color)]);

        let outside = FrameInput::at(250.0, 300.0);
        frame(&mut gui, outside.clone(), |g| g.do_blob(1, pos, color));
        let (clicked, _) = frame(&mut gui, outside.with_click(), |g| g.do_blob(1, pos, color));
        assert!(!clicked);
    }

    #[test]
    fn test_cursor_drawn_last_at_offset() {
        let mut gui = gui();
        let (_, backend) = frame(&mut gui, FrameInput::at(10.0, 20.0), |g| {
            g.do_cursor(true);
            g.do_overlay(1, Vector2::ZERO, Vector2::new(5.0, 5.0), Color::BLACK, DEFAULT_OVERLAY_OPACITY);
        });
        assert_eq!(
            backend.calls.last(),
            Some(&Call::Image(CURSOR_FILE.to_string(), Vector2::new(34.0, 44.0), Vector2::ZERO))
        );

        let (_, backend) = frame(&mut gui, FrameInput::at(10.0, 20.0), |_| {});
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_next_id_stable_per_frame() {
        let mut gui = gui();
        let (ids, _) = frame(&mut gui, FrameInput::default(), |g| (g.next_id(), g.next_id()));
        let (again, _) = frame(&mut gui, FrameInput::default(), |g| (g.next_id(), g.next_id()));
        assert_eq!(ids, (AUTO_ID_BASE + 1, AUTO_ID_BASE + 2));
        assert_eq!(ids, again);
    }

    #[test]
    fn test_duplicate_ids_counted() {
        let mut gui = gui();
        frame(&mut gui, FrameInput::default(), |g| {
            g.do_text(3, Vector2::ZERO, "a", TextFlags::NORMAL);
            g.do_text(3, Vector2::ZERO, "b", TextFlags::NORMAL);
        });
        assert_eq!(gui.duplicate_ids(), 1);
    }

    #[test]
    fn test_byte_offset_handles_multibyte() {
        assert_eq!(byte_offset("äb", 0), 0);
        assert_eq!(byte_offset("äb", 1), 2);
        assert_eq!(byte_offset("äb", 2), 3);
    }
}
