//! Conversation-related types.

use std::fmt;

/// Who authored a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person using the workflow.
    User,
    /// The model.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One message in a conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// A turn written by the user.
    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A turn written by the model.
    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Who wrote the turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The turn text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An append-only log of turns for one workflow.
///
/// [`Conversation::clear`] is the only way to remove turns.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Appends a turn and returns it.
    #[inline]
    pub fn append(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// All turns, oldest first.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Removes every turn.
    #[inline]
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether there are no turns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The canonical report: the first turn, if it was written by the
    /// assistant.
    pub fn report(&self) -> Option<&Turn> {
        self.turns
            .first()
            .filter(|turn| turn.role == Role::Assistant)
    }
}
