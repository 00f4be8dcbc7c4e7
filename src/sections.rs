//! Scientific paper section kinds and their writing instructions.
//!
//! Each [`SectionKind`] maps to a fixed [`SectionProfile`] in a pure data
//! table; the generation stage appends the profile's instruction fragment to
//! its preamble instead of branching per kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// The seven supported paper section kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Abstract / summary.
    Abstract,
    /// Introduction.
    Introduction,
    /// Literature review.
    LiteratureReview,
    /// Methodology.
    Methodology,
    /// Results.
    Results,
    /// Discussion.
    Discussion,
    /// Conclusion.
    Conclusion,
}

/// The fixed writing template for one section kind.
///
/// The instruction fragment states the required content and target length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionProfile {
    /// Human-readable section name.
    pub label: &'static str,
    /// Instruction fragment appended to the scientific-writing preamble.
    pub instruction: &'static str,
}

const ABSTRACT: SectionProfile = SectionProfile {
    label: "Abstract",
    instruction: "Write a concise abstract (150-250 words) that introduces the research \
problem, states the central question or hypothesis, briefly describes the methodology, \
summarizes the key findings, and notes their significance. The abstract must be \
understandable on its own and give a complete overview.",
};

const INTRODUCTION: SectionProfile = SectionProfile {
    label: "Introduction",
    instruction: "Write a well-grounded introduction (2-3 pages) that presents the background \
and relevance of the topic, outlines the current state of research, identifies a research \
gap, formulates the central research question or hypothesis, defines the aim of the work, \
and briefly previews its structure. Cite relevant literature to support the argument.",
};

const LITERATURE_REVIEW: SectionProfile = SectionProfile {
    label: "Literature review",
    instruction: "Write a structured literature review (3-5 pages) that systematically surveys \
relevant research, presents the different theoretical approaches and perspectives, explains \
central concepts, theories, and models, compares methodological approaches, highlights \
consensus and controversy in the literature, identifies research gaps, and establishes a \
theoretical frame for the work. Organize the literature thematically, chronologically, or \
methodologically, and cite every source precisely.",
};

const METHODOLOGY: SectionProfile = SectionProfile {
    label: "Methodology",
    instruction: "Write a detailed methodology section (2-3 pages) that describes the research \
design (qualitative, quantitative, or mixed methods), explains the data collection methods, \
describes the sample (size, selection, characteristics), details the analysis procedures, \
names the tools, instruments, or software used, reflects on quality criteria and \
limitations, and describes the procedure precisely enough to be replicable. Justify \
methodological decisions with reference to the literature.",
};

const RESULTS: SectionProfile = SectionProfile {
    label: "Results",
    instruction: "Write a clear results section (3-4 pages) that presents the findings \
systematically, reports the data objectively and precisely, highlights the important \
results, describes tables, charts, or figures where the context mentions them, structures \
the findings by research question or hypothesis, reports quantitative data with statistical \
measures, and illustrates qualitative findings with examples. Stay descriptive; do not \
interpret the results yet.",
};

const DISCUSSION: SectionProfile = SectionProfile {
    label: "Discussion",
    instruction: "Write a critical discussion (3-4 pages) that summarizes the key findings, \
interprets them in the context of the existing literature, points out agreements and \
contradictions with prior research, answers the research questions, discusses theoretical \
and practical implications, reflects critically on the limitations of the study, \
underlines its strengths, and indicates directions for future research. Argue in a \
differentiated manner and cite relevant literature when situating the findings.",
};

const CONCLUSION: SectionProfile = SectionProfile {
    label: "Conclusion",
    instruction: "Write a concise conclusion (1-2 pages) that synthesizes the central \
findings, answers the research question, states the contribution to the field, points out \
practical implications, gives an outlook on future research, and closes with a strong, \
clear final statement. Introduce no new information.",
};

impl SectionKind {
    /// All section kinds, in canonical paper order.
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Abstract,
        SectionKind::Introduction,
        SectionKind::LiteratureReview,
        SectionKind::Methodology,
        SectionKind::Results,
        SectionKind::Discussion,
        SectionKind::Conclusion,
    ];

    /// The fixed writing template for this kind.
    pub fn profile(self) -> &'static SectionProfile {
        match self {
            SectionKind::Abstract => &ABSTRACT,
            SectionKind::Introduction => &INTRODUCTION,
            SectionKind::LiteratureReview => &LITERATURE_REVIEW,
            SectionKind::Methodology => &METHODOLOGY,
            SectionKind::Results => &RESULTS,
            SectionKind::Discussion => &DISCUSSION,
            SectionKind::Conclusion => &CONCLUSION,
        }
    }

    /// The snake_case identifier used in configuration and APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Abstract => "abstract",
            SectionKind::Introduction => "introduction",
            SectionKind::LiteratureReview => "literature_review",
            SectionKind::Methodology => "methodology",
            SectionKind::Results => "results",
            SectionKind::Discussion => "discussion",
            SectionKind::Conclusion => "conclusion",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RagError::Validation(format!("unknown section kind '{s}'")))
    }
}
