//! Contract of the pluggable text-editing widget.
//!
//! The widget itself lives outside this crate. The session only pushes plain
//! text plus a language tag into it, reads the text back, and asks it for one
//! instance per open tab. Each instance must be disposed when its tab closes.

/// The shared editor surface.
pub trait EditorWidget: Send + Sync {
    /// Replaces the displayed text and its language tag. Programmatic
    /// replacement is not reported as a user edit.
    fn set_content(&self, content: &str, language: &str);

    /// Clears the editor (no file selected).
    fn clear(&self);

    /// Returns the text currently held by the editor.
    fn content(&self) -> String;

    /// Creates the widget instance backing a newly opened tab.
    fn create_instance(&self, path: &str) -> Box<dyn EditorInstance>;
}

/// A widget instance owned by exactly one tab.
pub trait EditorInstance: Send {
    /// Releases the resources held by the instance.
    fn dispose(&mut self);
}
