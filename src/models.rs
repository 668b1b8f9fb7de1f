//! Wire data model for the TailorFlow backend.
//!
//! The shapes here mirror the backend's JSON contract field for field. The
//! client never validates parsed documents beyond deserialization; analysis
//! results are treated as immutable once received.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// ===============================
// Resume
// ===============================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    pub start: String,
    pub end: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectItem {
    pub name: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationItem {
    pub school: String,
    pub degree: String,
    pub grad: String,
}

/// A parsed resume. Skills keep their original order and may contain
/// duplicates; the backend owns normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resume {
    pub contact: Option<ResumeContact>,
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceItem>,
    pub projects: Option<Vec<ProjectItem>>,
    pub education: Option<Vec<EducationItem>>,
    pub other_sections: Option<BTreeMap<String, Vec<String>>>,
}

impl Resume {
    /// Display name for status lines ("Jane Doe" or a placeholder).
    pub fn display_name(&self) -> &str {
        self.contact
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .unwrap_or("(unnamed)")
    }
}

// ===============================
// Job description
// ===============================

/// A parsed job description. Immutable once parsed except for a user-supplied
/// title override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jd {
    pub title: Option<String>,
    pub company: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub required: Vec<String>,
    pub preferred: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Jd {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled role")
    }
}

// ===============================
// Analysis
// ===============================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedJd {
    pub skills: Vec<String>,
    pub responsibilities: Vec<String>,
}

/// Coverage percentages by section. The backend serializes these camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeSections {
    #[serde(rename = "skillsCoveragePct")]
    pub skills_coverage_pct: u8,
    #[serde(rename = "preferredCoveragePct")]
    pub preferred_coverage_pct: u8,
    #[serde(rename = "domainCoveragePct")]
    pub domain_coverage_pct: u8,
    #[serde(rename = "recencyScorePct")]
    pub recency_score_pct: Option<u8>,
    #[serde(rename = "hygieneScorePct")]
    pub hygiene_score_pct: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u8,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub sections: AnalyzeSections,
    #[serde(rename = "normalizedJD")]
    pub normalized_jd: NormalizedJd,
    #[serde(default)]
    pub hygiene_flags: Option<Vec<String>>,
}

impl AnalysisResult {
    pub fn hygiene_flags(&self) -> &[String] {
        self.hygiene_flags.as_deref().unwrap_or(&[])
    }
}

// ===============================
// Rewrite diffs
// ===============================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// One atomic edit in a rewrite diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffToken {
    pub op: DiffOp,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

// ===============================
// Request / response envelopes
// ===============================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseKind {
    Resume,
    Jd,
}

impl ParseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseKind::Resume => "resume",
            ParseKind::Jd => "jd",
        }
    }
}

impl fmt::Display for ParseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct ParseRequest<'a> {
    #[serde(rename = "type")]
    pub kind: ParseKind,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct ParseResponse {
    pub parsed: Value,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub resume: &'a Resume,
    pub jd: &'a Jd,
}

#[derive(Debug, Serialize)]
pub struct RewriteConstraints<'a> {
    pub jd_keywords: &'a [String],
    pub max_words: u32,
}

#[derive(Debug, Serialize)]
pub struct RewriteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<&'a str>,
    pub section: &'a str,
    pub text: &'a str,
    pub constraints: RewriteConstraints<'a>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewriteResponse {
    pub rewritten: String,
    #[serde(default)]
    pub diff: Vec<DiffToken>,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ===============================
// Event-loop messages
// ===============================

/// Which logical action an async task was running. Keys the per-action busy
/// flags and error toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ParseResume,
    ParseJd,
    Analyze,
    Rewrite,
    BatchRewrite,
    Export,
    Health,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::ParseResume => "parse resume",
            ActionKind::ParseJd => "parse JD",
            ActionKind::Analyze => "analyze",
            ActionKind::Rewrite => "rewrite",
            ActionKind::BatchRewrite => "batch rewrite",
            ActionKind::Export => "export",
            ActionKind::Health => "health check",
        }
    }
}

/// Where a completed rewrite should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteTarget {
    /// The interactive drawer; dropped if the drawer was closed meanwhile.
    Drawer,
    /// A specific experience bullet (batch mode applies directly).
    Bullet { exp: usize, bullet: usize },
}

/// Messages posted back to the UI thread by spawned tasks. The app state tree
/// is mutated only when one of these is applied.
#[derive(Debug)]
pub enum AppEvent {
    ResumeParsed(Box<Resume>),
    JdParsed(Box<Jd>),
    AnalyzeDone(Box<AnalysisResult>),
    RewriteDone {
        target: RewriteTarget,
        rewritten: String,
        diff: Vec<DiffToken>,
    },
    BatchProgress {
        done: usize,
        total: usize,
    },
    BatchDone,
    ExportDone {
        path: PathBuf,
    },
    HealthChecked {
        ok: bool,
    },
    ActionFailed {
        action: ActionKind,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_result_matches_backend_shape() {
        let json = r#"{
            "score": 87,
            "matched": ["Python", "React"],
            "missing": ["Docker"],
            "sections": {
                "skillsCoveragePct": 80,
                "preferredCoveragePct": 60,
                "domainCoveragePct": 90,
                "recencyScorePct": 85,
                "hygieneScorePct": 75
            },
            "normalizedJD": {
                "skills": ["Python", "React", "Docker"],
                "responsibilities": ["Build scalable web applications"]
            },
            "hygiene_flags": ["missing_quantified_impact"]
        }"#;

        let a: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(a.score, 87);
        assert_eq!(a.sections.skills_coverage_pct, 80);
        assert_eq!(a.sections.recency_score_pct, Some(85));
        assert_eq!(a.normalized_jd.skills.len(), 3);
        assert_eq!(a.hygiene_flags(), &["missing_quantified_impact".to_string()]);
    }

    #[test]
    fn analysis_result_tolerates_missing_optionals() {
        let json = r#"{
            "score": 40,
            "matched": [],
            "missing": ["Go"],
            "sections": {
                "skillsCoveragePct": 0,
                "preferredCoveragePct": 0,
                "domainCoveragePct": 10
            },
            "normalizedJD": {"skills": ["Go"], "responsibilities": []}
        }"#;

        let a: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(a.sections.recency_score_pct, None);
        assert!(a.hygiene_flags().is_empty());
    }

    #[test]
    fn diff_tokens_round_trip() {
        let json = r#"[
            {"op": "equal", "from": "Built", "to": "Built"},
            {"op": "insert", "from": "", "to": "scalable "},
            {"op": "replace", "from": "various technologies", "to": "Python"}
        ]"#;

        let diff: Vec<DiffToken> = serde_json::from_str(json).unwrap();
        assert_eq!(diff[0].op, DiffOp::Equal);
        assert_eq!(diff[1].op, DiffOp::Insert);
        assert_eq!(diff[2].from, "various technologies");
    }

    #[test]
    fn parse_request_uses_wire_field_names() {
        let req = ParseRequest {
            kind: ParseKind::Jd,
            content: "text",
            filename: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["type"], "jd");
        assert!(v.get("filename").is_none());
    }

    #[test]
    fn resume_round_trips_through_json() {
        let resume = Resume {
            contact: Some(ResumeContact {
                name: Some("Jane Doe".into()),
                email: Some("jane@example.com".into()),
                phone: None,
                links: vec!["https://example.com".into()],
            }),
            summary: Some("Engineer".into()),
            skills: vec!["Rust".into(), "Rust".into(), "SQL".into()],
            experience: vec![ExperienceItem {
                company: "Acme".into(),
                role: "Engineer".into(),
                location: None,
                start: "2021".into(),
                end: None,
                bullets: vec!["Shipped things".into()],
            }],
            projects: None,
            education: None,
            other_sections: None,
        };

        let text = serde_json::to_string(&resume).unwrap();
        let back: Resume = serde_json::from_str(&text).unwrap();
        // Duplicate skills survive the trip in order.
        assert_eq!(back.skills, resume.skills);
        assert_eq!(back.display_name(), "Jane Doe");
    }
}
