//! Plain-text rendering of workflow state.
//!
//! Every function here is pure: the same state always renders to the same
//! text. Colors are added by the binary.

use std::fmt::Write as _;

use docchat_core::artifact::Artifact;
use docchat_core::conversation::Role;
use docchat_core::prompt::Intent;
use docchat_core::{Stage, WorkflowSession, Workbench};
use strum::IntoEnumIterator;

/// Renders the whole tab: header, artifact, parameters, next step and
/// transcript.
pub fn render(session: &WorkflowSession) -> String {
    let mut out = String::new();
    let intent = session.intent();
    let _ = writeln!(out, "== {} ==", session.label());
    let _ = writeln!(out, "Intent: {} ({})", intent.label(), intent.name());
    let _ = writeln!(out, "Stage: {}", session.stage());
    match session.artifact() {
        Some(artifact) => {
            let _ = writeln!(out, "File: {}", preview(artifact));
        }
        None => {
            let _ = writeln!(out, "File: none");
        }
    }
    if !session.params().is_empty() {
        let params = session
            .params()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Params: {params}");
    }
    if let Some(hint) = next_step(session) {
        let _ = writeln!(out, "Next: {hint}");
    }

    let turns = session.conversation().turns();
    for (idx, turn) in turns.iter().enumerate() {
        out.push('\n');
        let title = match turn.role() {
            Role::Assistant if idx == 0 => "Report",
            Role::Assistant => "Assistant",
            Role::User => "You",
        };
        let _ = writeln!(out, "[{title}]");
        let _ = writeln!(out, "{}", turn.content());
    }
    out
}

/// One line describing an uploaded file: name, kind and size.
pub fn preview(artifact: &Artifact) -> String {
    format!(
        "{} ({}, {})",
        artifact.name(),
        artifact.media_type(),
        format_size(artifact.len())
    )
}

/// Lists every intent with its label and what it needs.
pub fn intents() -> String {
    let mut out = String::new();
    for intent in Intent::iter() {
        let mut needs = Vec::new();
        if intent.needs_artifact() {
            needs.push("file".to_owned());
        }
        needs.extend(intent.required_params().map(str::to_owned));
        let needs = if needs.is_empty() {
            String::new()
        } else {
            format!(" [needs {}]", needs.join(", "))
        };
        let _ = writeln!(out, "{:<22}{}{needs}", intent.name(), intent.label());
    }
    out
}

/// Lists the tabs, marking the active one.
pub fn tabs(workbench: &Workbench) -> String {
    let active = workbench.active().label();
    let mut out = String::new();
    for tab in workbench.tabs() {
        let marker = if tab.label() == active { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {} ({}, {}, {} turn(s))",
            tab.label(),
            tab.intent().name(),
            tab.stage(),
            tab.conversation().len()
        );
    }
    out
}

/// What the user can do next, if anything needs doing.
pub fn next_step(session: &WorkflowSession) -> Option<String> {
    let intent = session.intent();
    match session.stage() {
        Stage::Empty | Stage::ArtifactLoaded => {
            if intent.needs_artifact() && session.artifact().is_none() {
                return Some("upload a file with /upload <path>".to_owned());
            }
            let missing: Vec<_> = intent
                .required_params()
                .filter(|name| {
                    session
                        .params()
                        .get(*name)
                        .is_none_or(|value| value.trim().is_empty())
                })
                .collect();
            if missing.is_empty() {
                Some("run /generate".to_owned())
            } else {
                Some(format!(
                    "set {} with /set, then run /generate",
                    missing.join(", ")
                ))
            }
        }
        Stage::ReportGenerated => Some(
            "ask a follow-up question, or /export the report".to_owned(),
        ),
        Stage::Conversing => None,
    }
}

/// Formats a byte count for display, e.g. `12.5 KB`.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let size = bytes as f64;
    if size >= MB {
        format!("{:.1} MB", size / MB)
    } else if size >= KB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawing() -> Artifact {
        Artifact::new("drawing.png", "image/png", vec![0u8; 2048]).unwrap()
    }

    #[test]
    fn test_render_fresh_tab() {
        let session = WorkflowSession::new("Analysis Report", Intent::GeneralCheck);
        assert_eq!(
            render(&session),
            "== Analysis Report ==\n\
             Intent: General check (general-check)\n\
             Stage: empty\n\
             File: none\n\
             Next: upload a file with /upload <path>\n"
        );
    }

    #[test]
    fn test_render_with_artifact_and_params() {
        let mut session = WorkflowSession::new("Homework", Intent::HomeworkSolver);
        session.upload(drawing());
        session.set_param("subject", "thermodynamics");

        let text = render(&session);
        assert!(text.contains("File: drawing.png (image, 2.0 KB)\n"));
        assert!(text.contains("Params: subject=thermodynamics\n"));
        assert!(text.contains("Next: run /generate\n"));
        assert_eq!(render(&session), text);
    }

    #[test]
    fn test_next_step_lists_missing_params() {
        let mut session =
            WorkflowSession::new("Interview", Intent::InterviewRehearsal);
        session.set_param("company", "ACME");
        assert_eq!(
            next_step(&session).as_deref(),
            Some("set position with /set, then run /generate")
        );
    }

    #[test]
    fn test_intents_lists_every_intent() {
        let text = intents();
        assert_eq!(text.lines().count(), Intent::iter().count());
        assert!(text.contains("interview-rehearsal"));
        assert!(text.contains("[needs company, position]"));
    }

    #[test]
    fn test_tabs_marks_active() {
        let mut workbench = Workbench::new("A", Intent::GeneralCheck);
        workbench.open("B", Intent::StudyNotes);
        assert_eq!(
            tabs(&workbench),
            "  A (general-check, empty, 0 turn(s))\n\
             * B (study-notes, empty, 0 turn(s))\n"
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
