//! Instruction templates for every analysis intent.

use std::collections::BTreeMap;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::Error;

/// Parameter values keyed by name.
pub type Params = BTreeMap<String, String>;

/// What the user wants the model to do. Each intent maps to exactly one
/// fixed template.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Intent {
    /// Missing dimensions and drawing errors.
    GeneralCheck,
    /// Machining difficulties from a CNC operator's view.
    Machinist,
    /// Tolerances and GD&T callouts.
    QualityControl,
    /// Material recommendations for the part.
    MaterialAdvisor,
    /// Manufacturing cost and its drivers.
    CostEstimate,
    /// Step-by-step solution of an uploaded problem.
    HomeworkSolver,
    /// Side-by-side comparison of named materials.
    MaterialComparison,
    /// A mock job interview, one question at a time.
    InterviewRehearsal,
    /// A formal internship log entry from notes.
    InternshipLog,
    /// Study notes from uploaded course material.
    StudyNotes,
}

impl Intent {
    /// Looks an intent up by its kebab-case name.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        name.trim()
            .parse()
            .map_err(|_| Error::InvalidIntent(name.to_owned()))
    }

    /// The kebab-case name, e.g. `general-check`.
    #[inline]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// A human-readable title for menus.
    #[inline]
    pub fn label(self) -> &'static str {
        self.template().label
    }

    /// Whether a report can only be generated with an uploaded artifact.
    #[inline]
    pub fn needs_artifact(self) -> bool {
        self.template().needs_artifact
    }

    /// Names of the parameters without a default value.
    pub fn required_params(self) -> impl Iterator<Item = &'static str> {
        self.template()
            .params
            .iter()
            .filter(|param| param.default.is_none())
            .map(|param| param.name)
    }

    fn template(self) -> &'static Template {
        match self {
            Intent::GeneralCheck => &GENERAL_CHECK,
            Intent::Machinist => &MACHINIST,
            Intent::QualityControl => &QUALITY_CONTROL,
            Intent::MaterialAdvisor => &MATERIAL_ADVISOR,
            Intent::CostEstimate => &COST_ESTIMATE,
            Intent::HomeworkSolver => &HOMEWORK_SOLVER,
            Intent::MaterialComparison => &MATERIAL_COMPARISON,
            Intent::InterviewRehearsal => &INTERVIEW_REHEARSAL,
            Intent::InternshipLog => &INTERNSHIP_LOG,
            Intent::StudyNotes => &STUDY_NOTES,
        }
    }
}

/// Builds the instruction text for `intent`.
///
/// `{name}` placeholders are replaced by the parameter values verbatim.
/// Blank values count as absent; absent optional parameters take their
/// default, absent required ones fail with [`Error::MissingParameter`].
/// Parameters the template doesn't use are ignored.
pub fn build(intent: Intent, params: &Params) -> Result<String, Error> {
    let template = intent.template();

    let mut values = BTreeMap::new();
    for param in template.params {
        let value = params
            .get(param.name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
            .or(param.default)
            .ok_or(Error::MissingParameter {
                intent,
                name: param.name,
            })?;
        values.insert(param.name, value);
    }

    Ok(interpolate(template.text, &values))
}

struct Param {
    name: &'static str,
    default: Option<&'static str>,
}

struct Template {
    label: &'static str,
    needs_artifact: bool,
    text: &'static str,
    params: &'static [Param],
}

const LANGUAGE: Param = Param {
    name: "language",
    default: Some("English"),
};

macro_rules! drawing_template {
    ($label:literal, $focus:literal) => {
        Template {
            label: $label,
            needs_artifact: true,
            text: concat!(
                "You are an expert mechanical engineer. Examine the attached file. ",
                $focus,
                " Answer in {language}, in detail, as bullet points."
            ),
            params: &[LANGUAGE],
        }
    };
}

static GENERAL_CHECK: Template = drawing_template!(
    "General check",
    "List the missing dimensions and the drawing errors."
);

static MACHINIST: Template = drawing_template!(
    "Machinist (CNC / lathe)",
    "Look at it as a CNC operator would. What makes this part hard to machine?"
);

static QUALITY_CONTROL: Template = drawing_template!(
    "Quality control (GD&T)",
    "Focus on the tolerances and the geometric tolerancing callouts."
);

static MATERIAL_ADVISOR: Template = drawing_template!(
    "Material advisor",
    "Recommend suitable materials for this part and explain the trade-offs."
);

static COST_ESTIMATE: Template = drawing_template!(
    "Cost estimate",
    "Estimate the manufacturing cost of this part and name the cost drivers."
);

static HOMEWORK_SOLVER: Template = Template {
    label: "Homework solver",
    needs_artifact: true,
    text: "You are a patient {subject} tutor. Solve the problem in the attached \
           file step by step and explain the reasoning behind every step. \
           Answer in {language}.",
    params: &[
        Param {
            name: "subject",
            default: Some("engineering"),
        },
        LANGUAGE,
    ],
};

static MATERIAL_COMPARISON: Template = Template {
    label: "Material comparison",
    needs_artifact: false,
    text: "You are a materials engineer. Compare the following materials: \
           {materials}. Cover mechanical properties, machinability, corrosion \
           resistance, cost and typical applications, then finish with a \
           recommendation. Answer in {language}, as a table followed by \
           bullet points.",
    params: &[
        Param {
            name: "materials",
            default: None,
        },
        LANGUAGE,
    ],
};

static INTERVIEW_REHEARSAL: Template = Template {
    label: "Interview rehearsal",
    needs_artifact: false,
    text: "You are an interviewer at {company} hiring for the {position} \
           position. Ask me one interview question at a time and wait for my \
           answer. After each answer give short feedback, then ask the next \
           question. Answer in {language}.",
    params: &[
        Param {
            name: "company",
            default: None,
        },
        Param {
            name: "position",
            default: None,
        },
        LANGUAGE,
    ],
};

static INTERNSHIP_LOG: Template = Template {
    label: "Internship log",
    needs_artifact: false,
    text: "You are helping an engineering intern write the internship log \
           entry for {date}. Turn these notes into a formal, technical log \
           entry: {activities}. Answer in {language}.",
    params: &[
        Param {
            name: "activities",
            default: None,
        },
        Param {
            name: "date",
            default: Some("today"),
        },
        LANGUAGE,
    ],
};

static STUDY_NOTES: Template = Template {
    label: "Study notes",
    needs_artifact: true,
    text: "You are a study assistant for the course {course}. Summarize the \
           attached material into concise study notes with the key concepts, \
           formulas and likely exam questions. Answer in {language}.",
    params: &[
        Param {
            name: "course",
            default: None,
        },
        LANGUAGE,
    ],
};

// Single pass, so placeholders inside substituted values stay untouched.
fn interpolate(template: &str, values: &BTreeMap<&str, &str>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if values.contains_key(&after[..end]) => {
                output.push_str(values[&after[..end]]);
                rest = &after[end + 1..];
            }
            _ => {
                output.push('{');
                rest = after;
            }
        }
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_intent_names_round_trip() {
        for intent in Intent::iter() {
            assert_eq!(Intent::from_name(intent.name()).unwrap(), intent);
        }
        assert_eq!(
            Intent::from_name("General-Check").unwrap(),
            Intent::GeneralCheck
        );
    }

    #[test]
    fn test_unknown_intent() {
        let err = Intent::from_name("astrology").unwrap_err();
        assert!(matches!(err, Error::InvalidIntent(ref name) if name == "astrology"));
    }

    #[test]
    fn test_general_check_uses_default_language() {
        let prompt = build(Intent::GeneralCheck, &Params::new()).unwrap();
        assert_eq!(
            prompt,
            "You are an expert mechanical engineer. Examine the attached file. \
             List the missing dimensions and the drawing errors. Answer in \
             English, in detail, as bullet points."
        );
    }

    #[test]
    fn test_values_are_interpolated_verbatim() {
        let prompt = build(
            Intent::InterviewRehearsal,
            &params(&[
                ("company", "ACME {language} & Co"),
                ("position", "Design Engineer"),
                ("language", "Turkish"),
                ("unused", "ignored"),
            ]),
        )
        .unwrap();
        assert!(prompt.starts_with(
            "You are an interviewer at ACME {language} & Co hiring for the \
             Design Engineer position."
        ));
        assert!(prompt.ends_with("Answer in Turkish."));
        assert!(!prompt.contains("ignored"));
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = build(
            Intent::InterviewRehearsal,
            &params(&[("company", "ACME"), ("position", "  ")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParameter {
                intent: Intent::InterviewRehearsal,
                name: "position"
            }
        ));
    }

    #[test]
    fn test_build_is_deterministic() {
        let params = params(&[("materials", "AISI 304, AISI 316L")]);
        let first = build(Intent::MaterialComparison, &params).unwrap();
        for _ in 0..10 {
            assert_eq!(build(Intent::MaterialComparison, &params).unwrap(), first);
        }
    }

    #[test]
    fn test_every_template_has_no_dangling_placeholder() {
        for intent in Intent::iter() {
            let values: Params = intent
                .required_params()
                .map(|name| (name.to_owned(), "x".to_owned()))
                .collect();
            let prompt = build(intent, &values).unwrap();
            assert!(!prompt.contains('{'), "{intent}: {prompt}");
        }
    }
}
