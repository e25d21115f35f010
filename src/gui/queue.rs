use crate::color::Color;
use crate::font::TextFlags;
use crate::geometry::Vector2;
use crate::render::RenderBackend;

/// A deferred draw call, recorded while widgets run and replayed in `end()`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        text: String,
        position: Vector2,
        flags: TextFlags,
    },
    Image {
        name: String,
        position: Vector2,
        size: Vector2,
    },
    Overlay {
        opacity: f32,
        top_left: Vector2,
        bottom_right: Vector2,
        color: Color,
    },
    Blob {
        position: Vector2,
        color: Color,
    },
}

impl DrawCommand {
    pub fn execute(&self, backend: &mut dyn RenderBackend) -> Result<(), String> {
        match self {
            DrawCommand::Text { text, position, flags } => backend.draw_text(text, *position, *flags),
            DrawCommand::Image { name, position, size } => backend.draw_image(name, *position, *size),
            DrawCommand::Overlay {
                opacity,
                top_left,
                bottom_right,
                color,
            } => backend.draw_overlay(*opacity, *top_left, *bottom_right, *color),
            DrawCommand::Blob { position, color } => backend.draw_blob(*position, *color),
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderQueue {
    commands: Vec<DrawCommand>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Replays every command in call order and empties the queue.
    ///
    /// A failing command does not stop the rest; the first error is returned.
    pub fn flush(&mut self, backend: &mut dyn RenderBackend) -> Result<(), String> {
        let mut result = Ok(());
        for command in self.commands.drain(..) {
            if let Err(e) = command.execute(backend) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::{Call, RecordingBackend};

    #[test]
    fn test_flush_keeps_order_and_empties() {
        let mut queue = RenderQueue::new();
        queue.push(DrawCommand::Overlay {
            opacity: 0.5,
            top_left: Vector2::ZERO,
            bottom_right: Vector2::new(10.0, 10.0),
            color: Color::BLACK,
        });
        queue.push(DrawCommand::Text {
            text: "hi".to_string(),
            position: Vector2::new(1.0, 2.0),
            flags: TextFlags::NORMAL,
        });
        queue.push(DrawCommand::Blob {
            position: Vector2::new(3.0, 4.0),
            color: Color::WHITE,
        });
        assert_eq!(queue.len(), 3);

        let mut backend = RecordingBackend::default();
        queue.flush(&mut backend).unwrap();

        assert!(queue.is_empty());
        assert_eq!(
            backend.calls,
            vec![
                Call::Overlay(0.5, Vector2::ZERO, Vector2::new(10.0, 10.0), Color::BLACK),
                Call::Text("hi".to_string(), Vector2::new(1.0, 2.0), TextFlags::NORMAL),
                Call::Blob(Vector2::new(3.0, 4.0), Color::WHITE),
            ]
        );
    }
}
