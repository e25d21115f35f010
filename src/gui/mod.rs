//! Immediate-Mode GUI
//!
//! Menus are built every frame by calling widget functions on an [`Imgui`].
//! Each call handles that widget's input and returns the result right away
//! (clicked, value changed, entry selected); drawing is queued and replayed
//! on the render backend when the frame ends.
//!
//! # Frame Structure
//!
//! - [`Imgui::begin`] with the frame's [`FrameInput`](crate::input::FrameInput)
//! - any number of `do_*` widget calls, each with a widget id that stays the
//!   same from frame to frame
//! - [`Imgui::end`] to draw
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::gui::Imgui;
//!
//! gui.begin(input.poll());
//! gui.do_cursor(true);
//! if gui.do_button_id(1, Vector2::new(400.0, 300.0), StringId::MenuStart, TextFlags::ALIGN_CENTER) {
//!     state = AppState::Match;
//! }
//! gui.end(backend.as_mut())?;
//! ```

pub mod imgui;
pub mod queue;
pub mod state;

pub use imgui::{DEFAULT_OVERLAY_OPACITY, Imgui, SelectBoxAction};
