use serde::{Deserialize, Serialize};

use super::blocks::Block;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Everything before the first recognised heading.
    Front,
    DegreePrograms,
    CourseDescriptions,
    ProgramOutcomes,
    StandaloneCourses,
    Certificates,
    /// Known headings that only terminate the section before them.
    Other,
}

const HEADINGS: &[(&str, SectionKind)] = &[
    ("course descriptions", SectionKind::CourseDescriptions),
    ("program outcomes", SectionKind::ProgramOutcomes),
    ("standalone courses", SectionKind::StandaloneCourses),
    ("certificate programs", SectionKind::Certificates),
    ("certificates", SectionKind::Certificates),
    ("degree plans", SectionKind::DegreePrograms),
    ("degree programs", SectionKind::DegreePrograms),
    ("programs of study", SectionKind::DegreePrograms),
    ("tuition and fees", SectionKind::Other),
    ("academic policies", SectionKind::Other),
    ("admissions", SectionKind::Other),
    ("student services", SectionKind::Other),
    ("index", SectionKind::Other),
];

impl SectionKind {
    /// Matches a whole line against the heading table, ignoring case and a trailing colon.
    pub fn from_heading(line: &str) -> Option<SectionKind> {
        let normalized = line.trim().trim_end_matches(':').trim().to_lowercase();
        HEADINGS
            .iter()
            .find(|(h, _)| *h == normalized)
            .map(|(_, kind)| *kind)
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Front => "Front Matter",
            SectionKind::DegreePrograms => "Degree Programs",
            SectionKind::CourseDescriptions => "Course Descriptions",
            SectionKind::ProgramOutcomes => "Program Outcomes",
            SectionKind::StandaloneCourses => "Standalone Courses",
            SectionKind::Certificates => "Certificate Programs",
            SectionKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    /// Index of the first body line in the document's block list.
    pub start: usize,
    pub blocks: Vec<Block>,
    pub lines: Vec<String>,
}

impl Section {
    pub fn entries(&self) -> impl Iterator<Item = (&Block, &str)> {
        self.blocks.iter().zip(self.lines.iter().map(|l| l.as_str()))
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Cut the document at every recognised heading. Each section runs from its
/// heading to the next heading or the end of the document.
pub fn cluster_sections(lines: &[&str], blocks: &[Block]) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section {
        kind: SectionKind::Front,
        start: 0,
        blocks: Vec::new(),
        lines: Vec::new(),
    };

    for (i, (block, line)) in blocks.iter().zip(lines.iter()).enumerate() {
        if let Block::Heading(kind) = block {
            let next = Section {
                kind: *kind,
                start: i + 1,
                blocks: Vec::new(),
                lines: Vec::new(),
            };
            let done = std::mem::replace(&mut current, next);
            if done.kind != SectionKind::Front || !done.blocks.is_empty() {
                sections.push(done);
            }
            continue;
        }
        current.blocks.push(block.clone());
        current.lines.push(line.trim().to_string());
    }
    sections.push(current);

    sections
}

/// First section of `kind` that has any non-empty content.
pub fn find_section(sections: &[Section], kind: SectionKind) -> Option<&Section> {
    sections
        .iter()
        .filter(|s| s.kind == kind)
        .find(|s| s.blocks.iter().any(|b| !matches!(b, Block::Empty | Block::Artifact)))
}

// ── Tests ──
