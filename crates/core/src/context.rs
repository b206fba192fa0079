//! Merges instructions, the artifact and conversation history into one
//! model request.

use docchat_model::{ModelRequest, Part};

use crate::artifact::Artifact;
use crate::conversation::{Conversation, Turn};

/// The payload handed to the gateway.
pub type RequestPayload = ModelRequest;

/// How much history goes into each request. Truncation always drops the
/// oldest turns first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HistoryWindow {
    /// Forward every prior turn.
    #[default]
    Unbounded,
    /// Forward at most this many of the most recent turns.
    LastTurns(usize),
    /// Forward the most recent turns whose flattened text, role prefix
    /// included, adds up to at most this many characters.
    MaxChars(usize),
}

impl HistoryWindow {
    /// Returns the suffix of `turns` that fits in this window.
    pub fn apply<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        let keep = match *self {
            HistoryWindow::Unbounded => turns.len(),
            HistoryWindow::LastTurns(max) => max.min(turns.len()),
            HistoryWindow::MaxChars(budget) => {
                let mut used = 0;
                turns
                    .iter()
                    .rev()
                    .take_while(|turn| {
                        used += flattened_len(turn);
                        used <= budget
                    })
                    .count()
            }
        };
        &turns[turns.len() - keep..]
    }
}

/// Builds the request for one generation call.
///
/// The order is fixed: instructions, then the artifact (sent again on every
/// call), then the windowed history one turn per part, then `new_input`.
/// Identical arguments always produce an identical request.
pub fn assemble(
    system_text: &str,
    artifact: Option<&Artifact>,
    conversation: &Conversation,
    new_input: Option<&str>,
    window: HistoryWindow,
) -> RequestPayload {
    let history = window.apply(conversation.turns());
    let mut parts = Vec::with_capacity(history.len() + 3);

    parts.push(Part::Text(system_text.to_owned()));
    if let Some(artifact) = artifact {
        parts.push(artifact.to_part());
    }
    parts.extend(history.iter().map(flatten_turn));
    if let Some(input) = new_input {
        parts.push(Part::Text(input.to_owned()));
    }

    let truncated = conversation.len() - history.len();
    if truncated > 0 {
        debug!("dropped {truncated} oldest turn(s) from the request");
    }
    trace!("assembled {} part(s)", parts.len());
    ModelRequest { parts }
}

#[inline]
fn flatten_turn(turn: &Turn) -> Part {
    Part::Text(format!("{}: {}", turn.role(), turn.content()))
}

// Characters of the text `flatten_turn` produces.
#[inline]
fn flattened_len(turn: &Turn) -> usize {
    turn.role().to_string().len() + 2 + turn.content().chars().count()
}

#[cfg(test)]
mod tests {
    use docchat_model::Blob;

    use super::*;

    fn drawing() -> Artifact {
        Artifact::new("drawing.png", "image/png", &b"\x89PNG-data"[..]).unwrap()
    }

    fn sample_conversation() -> Conversation {
        let mut conversation = Conversation::default();
        conversation.append(Turn::assistant("Report text A"));
        conversation.append(Turn::user("What tolerance applies?"));
        conversation.append(Turn::assistant("H7 on the bore."));
        conversation
    }

    #[test]
    fn test_part_order() {
        let request = assemble(
            "Check the drawing.",
            Some(&drawing()),
            &sample_conversation(),
            Some("And the shaft?"),
            HistoryWindow::Unbounded,
        );
        assert_eq!(
            request.parts,
            vec![
                Part::Text("Check the drawing.".to_owned()),
                Part::Blob(Blob {
                    mime_type: "image/png".to_owned(),
                    data: drawing().bytes().clone(),
                }),
                Part::Text("Assistant: Report text A".to_owned()),
                Part::Text("User: What tolerance applies?".to_owned()),
                Part::Text("Assistant: H7 on the bore.".to_owned()),
                Part::Text("And the shaft?".to_owned()),
            ]
        );
    }

    #[test]
    fn test_without_artifact_or_input() {
        let request = assemble(
            "Compare AISI 304 and 316L.",
            None,
            &Conversation::default(),
            None,
            HistoryWindow::Unbounded,
        );
        assert_eq!(
            request.parts,
            vec![Part::Text("Compare AISI 304 and 316L.".to_owned())]
        );
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let conversation = sample_conversation();
        let artifact = drawing();
        let first = assemble(
            "Check.",
            Some(&artifact),
            &conversation,
            Some("Why?"),
            HistoryWindow::LastTurns(2),
        );
        let second = assemble(
            "Check.",
            Some(&artifact),
            &conversation,
            Some("Why?"),
            HistoryWindow::LastTurns(2),
        );
        assert_eq!(first, second);
        assert_eq!(first.text(), second.text());
    }

    #[test]
    fn test_window_drops_oldest_first() {
        let conversation = sample_conversation();
        let turns = conversation.turns();

        assert_eq!(HistoryWindow::Unbounded.apply(turns).len(), 3);
        assert_eq!(HistoryWindow::LastTurns(10).apply(turns).len(), 3);
        assert_eq!(HistoryWindow::LastTurns(0).apply(turns).len(), 0);

        let last_two = HistoryWindow::LastTurns(2).apply(turns);
        assert_eq!(last_two[0].content(), "What tolerance applies?");

        // "Assistant: H7 on the bore." is 26 chars, "User: What tolerance
        // applies?" before it is 29.
        let by_chars = HistoryWindow::MaxChars(30).apply(turns);
        assert_eq!(by_chars.len(), 1);
        assert_eq!(by_chars[0].content(), "H7 on the bore.");
        assert_eq!(HistoryWindow::MaxChars(54).apply(turns).len(), 1);
        assert_eq!(HistoryWindow::MaxChars(55).apply(turns).len(), 2);
        assert_eq!(HistoryWindow::MaxChars(25).apply(turns).len(), 0);
    }
}
