//! Keyboard shortcut mapping.

use crate::input::Modifiers;
use crate::tools::ToolKind;

/// An editor action triggered from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    SetTool(ToolKind),
    InsertImage,
    DeleteSelection,
    Undo,
    Redo,
    Copy,
    Paste,
    Duplicate,
    SelectAll,
    Escape,
    BringToFront,
    SendToBack,
    BringForward,
    SendBackward,
}

/// Map a key press to an editor action. `key` is the lowercase key name
/// ("a", "z", "delete", "escape", ...). Returns None for unbound keys.
///
/// Callers must not invoke this while an inline text edit is active; typed
/// characters belong to the text there.
pub fn action_for(key: &str, modifiers: Modifiers) -> Option<EditorAction> {
    if modifiers.command() {
        return match key {
            "z" if modifiers.shift => Some(EditorAction::Redo),
            "z" => Some(EditorAction::Undo),
            "y" => Some(EditorAction::Redo),
            "c" => Some(EditorAction::Copy),
            "v" => Some(EditorAction::Paste),
            "d" => Some(EditorAction::Duplicate),
            "a" => Some(EditorAction::SelectAll),
            "]" if modifiers.shift => Some(EditorAction::BringToFront),
            "[" if modifiers.shift => Some(EditorAction::SendToBack),
            "]" => Some(EditorAction::BringForward),
            "[" => Some(EditorAction::SendBackward),
            _ => None,
        };
    }

    match key {
        "delete" | "backspace" => Some(EditorAction::DeleteSelection),
        "escape" => Some(EditorAction::Escape),
        "i" => Some(EditorAction::InsertImage),
        _ => ToolKind::from_shortcut(key).map(EditorAction::SetTool),
    }
}
