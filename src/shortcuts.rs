//! Keyboard shortcuts for the document view. They listen to the events no
//! widget captured, so typing in a page-list field never flips pages.

use crate::message::Message;
use iced::event::{self, Event};
use iced::keyboard::{self, key};
use iced::{window, Subscription};

pub fn subscription() -> Subscription<Message> {
    event::listen_with(shortcut)
}

fn shortcut(event: Event, status: event::Status, _window: window::Id) -> Option<Message> {
    match (event, status) {
        (Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }), event::Status::Ignored) => {
            key_message(&key, modifiers)
        }
        _ => None,
    }
}

fn key_message(key: &keyboard::Key, modifiers: keyboard::Modifiers) -> Option<Message> {
    match key.as_ref() {
        keyboard::Key::Named(key::Named::ArrowLeft) => Some(Message::PrevPage),
        keyboard::Key::Named(key::Named::ArrowRight) => Some(Message::NextPage),
        keyboard::Key::Named(key::Named::Escape) => Some(Message::ClearSelection),
        keyboard::Key::Character("=" | "+") if modifiers.command() => Some(Message::ZoomIn),
        keyboard::Key::Character("-") if modifiers.command() => Some(Message::ZoomOut),
        keyboard::Key::Character("0") if modifiers.command() => Some(Message::ResetZoom),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(key: keyboard::Key) -> Event {
        Event::Keyboard(keyboard::Event::KeyPressed {
            modified_key: key.clone(),
            key,
            physical_key: key::Physical::Unidentified(key::NativeCode::Unidentified),
            location: keyboard::Location::Standard,
            modifiers: keyboard::Modifiers::default(),
            text: None,
            repeat: false,
        })
    }

    #[test]
    fn test_arrow_keys_change_page() {
        let none = keyboard::Modifiers::default();
        assert!(matches!(
            key_message(&keyboard::Key::Named(key::Named::ArrowRight), none),
            Some(Message::NextPage)
        ));
        assert!(matches!(
            key_message(&keyboard::Key::Named(key::Named::ArrowLeft), none),
            Some(Message::PrevPage)
        ));
    }

    #[test]
    fn test_zoom_keys_need_command_modifier() {
        let plus = keyboard::Key::Character("=".into());
        assert!(key_message(&plus, keyboard::Modifiers::default()).is_none());
        assert!(matches!(
            key_message(&plus, keyboard::Modifiers::COMMAND),
            Some(Message::ZoomIn)
        ));
        assert!(matches!(
            key_message(&keyboard::Key::Character("0".into()), keyboard::Modifiers::COMMAND),
            Some(Message::ResetZoom)
        ));
    }

    #[test]
    fn test_keys_captured_by_a_text_field_are_ignored() {
        let window = window::Id::unique();
        let right = || pressed(keyboard::Key::Named(key::Named::ArrowRight));
        let escape = pressed(keyboard::Key::Named(key::Named::Escape));

        assert!(shortcut(right(), event::Status::Captured, window).is_none());
        assert!(shortcut(escape, event::Status::Captured, window).is_none());
        assert!(matches!(
            shortcut(right(), event::Status::Ignored, window),
            Some(Message::NextPage)
        ));
    }
}
