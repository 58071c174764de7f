use crate::message::Message;
use iced::keyboard;
use iced::mouse;
use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke};
use iced::widget::image as iced_image;
use iced::{Color, Point, Rectangle, Renderer, Size, Theme, Vector};
use pdfcrop::Rect;

const BACKGROUND: Color = Color::from_rgb(0.35, 0.35, 0.35);
const SELECTION: Color = Color::from_rgb(0.9, 0.1, 0.1);
const CROPBOX: Color = Color::from_rgb(0.15, 0.35, 0.95);
const WASH: Color = Color::from_rgba(0.5, 0.5, 0.5, 0.5);

/// The current page with its selection and applied crop box. Every
/// rectangle here is already in canvas coordinates.
pub struct PageCanvas<'a> {
    pub image: Option<&'a iced_image::Handle>,
    pub offset: Vector,
    pub size: Size,
    pub selection: Option<Rect>,
    pub dragging: bool,
    pub cropbox: Option<Rect>,
}

#[derive(Debug, Default)]
pub struct CanvasState {
    modifiers: keyboard::Modifiers,
    pressed: bool,
    panning: bool,
}

fn to_point(p: Point) -> pdfcrop::Point {
    pdfcrop::Point::new(p.x, p.y)
}

fn to_rectangle(r: &Rect) -> Rectangle {
    Rectangle::new(Point::new(r.x0, r.y0), Size::new(r.width(), r.height()))
}

impl canvas::Program<Message> for PageCanvas<'_> {
    type State = CanvasState;

    fn update(
        &self,
        state: &mut Self::State,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        match event {
            canvas::Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
                state.modifiers = *modifiers;
                None
            }
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                state.pressed = true;
                state.panning = state.modifiers.shift();
                Some(
                    canvas::Action::publish(Message::CanvasPressed(
                        to_point(position),
                        state.panning,
                    ))
                    .and_capture(),
                )
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if state.pressed => {
                let position = cursor.position_from(bounds.position())?;
                Some(canvas::Action::publish(Message::CanvasDragged(to_point(position))).and_capture())
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) if state.pressed => {
                state.pressed = false;
                state.panning = false;
                let position = cursor
                    .position_from(bounds.position())
                    .unwrap_or(Point::ORIGIN);
                Some(canvas::Action::publish(Message::CanvasReleased(to_point(position))).and_capture())
            }
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) if state.modifiers.command() => {
                cursor.position_in(bounds)?;
                let y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } | mouse::ScrollDelta::Pixels { y, .. } => *y,
                };
                let message = if y > 0.0 {
                    Message::ZoomIn
                } else if y < 0.0 {
                    Message::ZoomOut
                } else {
                    return None;
                };
                Some(canvas::Action::publish(message).and_capture())
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);

        let page = Rectangle::new(Point::ORIGIN + self.offset, self.size);
        match self.image {
            Some(handle) => frame.draw_image(page, canvas::Image::new(handle.clone())),
            None => frame.fill_rectangle(page.position(), page.size(), Color::WHITE),
        }

        if let Some(cropbox) = &self.cropbox {
            let r = to_rectangle(cropbox);
            frame.stroke(
                &Path::rectangle(r.position(), r.size()),
                Stroke::default().with_color(CROPBOX).with_width(2.0),
            );
        }

        if let Some(selection) = &self.selection {
            let r = to_rectangle(selection);
            if self.dragging {
                // Grey out everything but the selection while drawing it.
                let (w, h) = (bounds.width, bounds.height);
                frame.fill_rectangle(Point::ORIGIN, Size::new(w, r.y.max(0.0)), WASH);
                frame.fill_rectangle(
                    Point::new(0.0, r.y + r.height),
                    Size::new(w, (h - r.y - r.height).max(0.0)),
                    WASH,
                );
                frame.fill_rectangle(Point::new(0.0, r.y), Size::new(r.x.max(0.0), r.height), WASH);
                frame.fill_rectangle(
                    Point::new(r.x + r.width, r.y),
                    Size::new((w - r.x - r.width).max(0.0), r.height),
                    WASH,
                );
            }
            frame.stroke(
                &Path::rectangle(r.position(), r.size()),
                Stroke::default().with_color(SELECTION).with_width(2.0),
            );
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if state.pressed && state.panning {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            if state.modifiers.shift() {
                mouse::Interaction::Grab
            } else {
                mouse::Interaction::Crosshair
            }
        } else {
            mouse::Interaction::default()
        }
    }
}
