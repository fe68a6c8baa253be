//! Declarative extraction rules.
//!
//! Each [`ExtractionRule`] names a [`CaseField`], a regex, the input it runs
//! against, and whether it may overwrite a value an earlier rule produced.
//! Rules are deserializable so a portal definition can ship its own list.
//!
//! The captured value is the `value` named group when the pattern has one,
//! otherwise the whole match. Case-identifier rules may also capture
//! `case_type`, `case_number`, and `filing_year` groups.

use regex::Regex;
use serde::Deserialize;

use crate::ExtractError;

/// A [`court_status_case_models::CaseRecord`] field a rule can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseField {
    CaseId,
    FilingDate,
    NextHearingDate,
    CaseStatus,
    Bench,
    Judge,
    CnrNumber,
    FilingAdvocate,
    SupplementaryLink,
    Petitioners,
    Respondents,
}

impl CaseField {
    /// Whether the field holds a list of parties.
    #[must_use]
    pub const fn is_party_list(self) -> bool {
        matches!(self, Self::Petitioners | Self::Respondents)
    }
}

/// Input a rule's pattern runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// Raw result-page markup.
    #[default]
    Html,
    /// Visible text, one text node per line.
    Text,
}

/// Whether a rule may replace a value set by an earlier rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    /// Only fill the field while it is still empty.
    #[default]
    FillEmpty,
    /// Replace the field whenever the rule yields a non-empty value.
    Override,
}

/// One extraction rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractionRule {
    /// Name used in logs and errors.
    pub label: String,
    /// Target field.
    pub field: CaseField,
    /// Regex pattern.
    pub pattern: String,
    /// Input the pattern runs against.
    #[serde(default)]
    pub source: RuleSource,
    /// Overwrite behaviour.
    #[serde(default)]
    pub mode: RuleMode,
}

impl ExtractionRule {
    /// Creates an HTML, fill-if-empty rule.
    #[must_use]
    pub fn new(label: &str, field: CaseField, pattern: &str) -> Self {
        Self {
            label: label.to_owned(),
            field,
            pattern: pattern.to_owned(),
            source: RuleSource::Html,
            mode: RuleMode::FillEmpty,
        }
    }

    /// Runs the rule against visible text instead of markup.
    #[must_use]
    pub const fn on_text(mut self) -> Self {
        self.source = RuleSource::Text;
        self
    }

    /// Lets the rule overwrite earlier values.
    #[must_use]
    pub const fn overriding(mut self) -> Self {
        self.mode = RuleMode::Override;
        self
    }

    /// Compiles the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidPattern`] if the regex does not compile.
    pub fn compile(&self) -> Result<CompiledRule, ExtractError> {
        let regex = Regex::new(&self.pattern).map_err(|e| ExtractError::InvalidPattern {
            label: self.label.clone(),
            reason: e.to_string(),
        })?;
        Ok(CompiledRule {
            rule: self.clone(),
            regex,
        })
    }
}

/// A rule with its compiled regex.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// The rule definition.
    pub rule: ExtractionRule,
    regex: Regex,
}

/// What a rule captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleMatch {
    /// The `value` group, or the whole match.
    pub value: String,
    /// The `case_type` group, if present.
    pub case_type: Option<String>,
    /// The `case_number` group, if present.
    pub case_number: Option<String>,
    /// The `filing_year` group, if present.
    pub filing_year: Option<String>,
}

impl CompiledRule {
    /// Returns the first match in `input` whose value contains a letter or
    /// digit.
    #[must_use]
    pub fn find(&self, input: &str) -> Option<RuleMatch> {
        self.regex.captures_iter(input).find_map(|caps| {
            let group = |name: &str| caps.name(name).map(|m| m.as_str().to_owned());
            let value = group("value").unwrap_or_else(|| caps[0].to_owned());
            if !value.chars().any(char::is_alphanumeric) {
                return None;
            }

            Some(RuleMatch {
                value,
                case_type: group("case_type"),
                case_number: group("case_number"),
                filing_year: group("filing_year"),
            })
        })
    }
}

/// Pattern for a party list introduced by `label`.
///
/// The label must be followed by `:`, `-`, or the end of its text line (a
/// table cell boundary). The value is the rest of that line, or the next
/// line when the label stands alone, and stops early at any `stop` word.
fn labeled_parties(label: &str, stop: &str) -> String {
    format!(
        r"(?im)\b(?:{label})\b[^\S\n]*(?:[:\-]|$)[^\S\n]*\n?[^\S\n]*(?P<value>[^\n]*?)[^\S\n]*(?:\b(?:{stop})\b|$)"
    )
}

/// The built-in rule list, in evaluation order.
#[must_use]
pub fn default_rules() -> Vec<ExtractionRule> {
    vec![
        // ── Case identifier ─────────────────────────────────────────────
        ExtractionRule::new(
            "hyphenated case id",
            CaseField::CaseId,
            r"(?P<case_type>[A-Z][A-Z.]*\([A-Z.]+\))-(?P<case_number>\d+)/(?P<filing_year>\d{4})",
        ),
        ExtractionRule::new(
            "labeled case number",
            CaseField::CaseId,
            r"(?i)\bCase\s*(?:ID\b|No\b\.?|Number\b)\s*[:\-]?\s*(?P<value>[A-Za-z0-9.()/\-]*\d[A-Za-z0-9.()/\-]*)",
        )
        .on_text(),
        // ── Dates ───────────────────────────────────────────────────────
        ExtractionRule::new(
            "date of filing",
            CaseField::FilingDate,
            r"Date of Filing\s*:\s*(?P<value>[^<]+)",
        ),
        ExtractionRule::new(
            "filing date",
            CaseField::FilingDate,
            r"(?i)\bFiling\s+Date\s*:?\s*(?P<value>\d{1,2}[/-]\d{1,2}[/-]\d{4})",
        )
        .on_text(),
        ExtractionRule::new(
            "date of registration",
            CaseField::FilingDate,
            r"Date of Registration\s*:\s*(?P<value>[^<]+)",
        )
        .overriding(),
        ExtractionRule::new(
            "next hearing",
            CaseField::NextHearingDate,
            r"(?i)\bNext\s+(?:Hearing|Date)(?:\s+Date)?\s*:?\s*(?P<value>\d{1,2}[/-]\d{1,2}[/-]\d{4})",
        )
        .on_text(),
        // ── Labeled fields ──────────────────────────────────────────────
        ExtractionRule::new(
            "cnr number",
            CaseField::CnrNumber,
            r"CNR No\.\s*:\s*(?P<value>[^<]+)",
        ),
        ExtractionRule::new(
            "status",
            CaseField::CaseStatus,
            r"Status\s*:\s*(?P<value>[^<]+)",
        ),
        ExtractionRule::new(
            "status text",
            CaseField::CaseStatus,
            r"(?i)\bStatus\s*:?\s*(?P<value>[A-Za-z][A-Za-z ]*)",
        )
        .on_text(),
        ExtractionRule::new(
            "filing advocate",
            CaseField::FilingAdvocate,
            r"Filing Advocate\s*:\s*(?P<value>[^<]+)",
        ),
        ExtractionRule::new(
            "bench",
            CaseField::Bench,
            r"(?i)\bBench\s*:\s*(?P<value>[^\n]+)",
        )
        .on_text(),
        ExtractionRule::new(
            "judge",
            CaseField::Judge,
            r"(?i)\b(?:Judge|Coram)\s*:\s*(?P<value>[^\n]+)",
        )
        .on_text(),
        ExtractionRule::new(
            "data grid link",
            CaseField::SupplementaryLink,
            r#"action=['"](?P<value>[^'"]*lobis\.nic\.in[^'"]*)['"]"#,
        ),
        // ── Parties ─────────────────────────────────────────────────────
        ExtractionRule::new(
            "party before vs.",
            CaseField::Petitioners,
            r"<b>(?P<value>[^<]*?)\s*Vs\.\s*</b></td></tr>",
        ),
        ExtractionRule::new(
            "petitioner",
            CaseField::Petitioners,
            &labeled_parties(r"Petitioners?", r"Respondents?|Next|Hearing"),
        )
        .on_text(),
        ExtractionRule::new(
            "applicant",
            CaseField::Petitioners,
            &labeled_parties(r"Applicants?", r"Respondents?|Next|Hearing"),
        )
        .on_text(),
        ExtractionRule::new(
            "plaintiff",
            CaseField::Petitioners,
            &labeled_parties(r"Plaintiffs?", r"Defendants?|Next|Hearing"),
        )
        .on_text(),
        ExtractionRule::new(
            "party after vs.",
            CaseField::Respondents,
            r"Vs\.\s*</b></td></tr><tr><td[^>]*><font[^>]*><b>(?P<value>[^<]*)</b></td></tr>",
        ),
        ExtractionRule::new(
            "respondent",
            CaseField::Respondents,
            &labeled_parties(r"Respondents?", r"Next|Hearing|Petitioners?"),
        )
        .on_text(),
        ExtractionRule::new(
            "opposite party",
            CaseField::Respondents,
            &labeled_parties(r"Opposite\s+Party", r"Next|Hearing"),
        )
        .on_text(),
        ExtractionRule::new(
            "defendant",
            CaseField::Respondents,
            &labeled_parties(r"Defendants?", r"Next|Hearing"),
        )
        .on_text(),
    ]
}

/// Compiles a rule list.
///
/// # Errors
///
/// Returns the first [`ExtractError::InvalidPattern`] encountered.
pub fn compile_rules(rules: &[ExtractionRule]) -> Result<Vec<CompiledRule>, ExtractError> {
    rules.iter().map(ExtractionRule::compile).collect()
}
