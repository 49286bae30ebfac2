//! Tokenizer state carried from one line to the next.

use std::sync::Arc;

use super::rule::RuleId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub rule: RuleId,
    /// End or while pattern with the begin match's back references filled in
    pub resolved_source: Option<String>,
    /// Scopes of the begin and end matches
    pub name_scopes: Vec<String>,
    /// Scopes of everything between begin and end
    pub content_scopes: Vec<String>,
    /// Position on the current line where the frame was pushed
    pub enter_pos: Option<usize>,
    /// Anchor position to restore when the frame is popped
    pub anchor_pos: Option<usize>,
}

/// The stack of open rules at the end of a line.
///
/// A stack is immutable once returned; tokenizing the next line builds a new one. Two stacks
/// compare equal when the same rules are open with the same scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStack {
    frames: Option<Arc<Vec<Frame>>>,
}

impl RuleStack {
    /// The state before the first line of a document.
    pub const INITIAL: RuleStack = RuleStack { frames: None };

    pub(crate) fn from_frames(mut frames: Vec<Frame>) -> Self {
        for frame in &mut frames {
            frame.enter_pos = None;
            frame.anchor_pos = None;
        }
        RuleStack {
            frames: Some(Arc::new(frames)),
        }
    }

    pub(crate) fn frames(&self) -> Option<&[Frame]> {
        self.frames.as_deref().map(Vec::as_slice)
    }

    pub fn is_initial(&self) -> bool {
        self.frames.is_none()
    }

    /// Number of open rules, counting the grammar root.
    pub fn depth(&self) -> usize {
        self.frames.as_ref().map_or(0, |frames| frames.len())
    }

    /// Scopes in effect at the end of the line.
    pub fn scopes(&self) -> &[String] {
        self.frames
            .as_ref()
            .and_then(|frames| frames.last())
            .map(|frame| frame.content_scopes.as_slice())
            .unwrap_or(&[])
    }
}
