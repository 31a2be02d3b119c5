//! Report Parsing
//!
//! Tolerant scraping of the tagged blocks the consultant prompt asks for.
//! Model output is free-form, so nothing here fails: missing or malformed tags
//! fall back to defaults and the remaining text is handed on as prose.
//!
//! Two phases:
//! 1. Health score: first `[HEALTH_SCORE: N]` wins, every `[HEALTH_SCORE...]`
//!    tag is removed.
//! 2. Sections: for each section tag, locate it, capture the span up to the
//!    next `[` (or end of text), keep the `-` lines, then remove tag and span.
//!    The `[` that ends a span is left alone since it opens the next tag.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::defaults;

// ============================================================================
// Parsed Report
// ============================================================================

/// Structured view of one model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReport {
    /// Overall assessment, always within 1..=100
    pub health_score: u8,
    pub critical_findings: Vec<String>,
    pub gold_opportunities: Vec<String>,
    /// Model text with every recognised tag block removed
    pub cleaned_prose: String,
}

/// Labelled bullet sections recognised in model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTag {
    CriticalFindings,
    GoldOpportunities,
}

impl SectionTag {
    /// Tag text between the brackets.
    pub fn label(self) -> &'static str {
        match self {
            SectionTag::CriticalFindings => "CRITICAL_FINDINGS",
            SectionTag::GoldOpportunities => "GOLD_OPPORTUNITIES",
        }
    }

    fn pattern(self) -> &'static Regex {
        static CRITICAL: OnceLock<Regex> = OnceLock::new();
        static GOLD: OnceLock<Regex> = OnceLock::new();
        let cell = match self {
            SectionTag::CriticalFindings => &CRITICAL,
            SectionTag::GoldOpportunities => &GOLD,
        };
        cell.get_or_init(|| {
            Regex::new(&format!(r"(?i)\[{}\]", self.label())).unwrap_or_else(|e| {
                unreachable!("section tag pattern must compile: {e}")
            })
        })
    }
}

// ============================================================================
// Entry Point
// ============================================================================

/// Parse raw model output into score, findings, opportunities and prose.
pub fn parse_report(text: &str) -> ParsedReport {
    let (health_score, mut prose) = extract_health_score(text);

    let (critical_findings, rest) = strip_section(&prose, SectionTag::CriticalFindings);
    prose = rest;
    let (gold_opportunities, rest) = strip_section(&prose, SectionTag::GoldOpportunities);
    prose = rest;

    ParsedReport {
        health_score,
        critical_findings,
        gold_opportunities,
        cleaned_prose: prose.trim().to_string(),
    }
}

// ============================================================================
// Phase 1: Health Score
// ============================================================================

fn health_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[HEALTH_SCORE:\s*(\d+)\s*\]")
            .unwrap_or_else(|e| unreachable!("health score pattern must compile: {e}"))
    })
}

fn health_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[HEALTH_SCORE:[^\]]*\]")
            .unwrap_or_else(|e| unreachable!("health tag pattern must compile: {e}"))
    })
}

/// Extract the health score and return the text with every health tag removed.
///
/// Absent or malformed tags yield [`defaults::DEFAULT_HEALTH_SCORE`]; numbers
/// outside the valid range are clamped.
pub fn extract_health_score(text: &str) -> (u8, String) {
    let score = health_value_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(defaults::DEFAULT_HEALTH_SCORE, |digits| {
            // all digits, so a parse failure can only be overflow
            let value = digits.as_str().parse::<u64>().unwrap_or(u64::MAX);
            clamp_score(value)
        });

    let stripped = health_tag_regex().replace_all(text, "").into_owned();
    (score, stripped)
}

fn clamp_score(value: u64) -> u8 {
    let clamped = value.clamp(
        u64::from(defaults::HEALTH_SCORE_MIN),
        u64::from(defaults::HEALTH_SCORE_MAX),
    );
    u8::try_from(clamped).unwrap_or(defaults::HEALTH_SCORE_MAX)
}

// ============================================================================
// Phase 2: Tagged Sections
// ============================================================================

/// Byte range of the first occurrence of `tag`, case-insensitive.
pub fn locate_tag(text: &str, tag: SectionTag) -> Option<Range<usize>> {
    tag.pattern().find(text).map(|m| m.range())
}

/// Span after a tag: from `start` up to the next `[` or end of text.
pub fn capture_span(text: &str, start: usize) -> Range<usize> {
    let end = text[start..].find('[').map_or(text.len(), |offset| start + offset);
    start..end
}

/// Lines whose trimmed form starts with `-`, marker stripped and trimmed.
pub fn bullet_lines(span: &str) -> Vec<String> {
    span.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-'))
        .map(|item| item.trim().to_string())
        .collect()
}

/// Remove every occurrence of `tag` with its span.
///
/// The bullet list comes from the first occurrence; later duplicates are
/// stripped without contributing items.
pub fn strip_section(text: &str, tag: SectionTag) -> (Vec<String>, String) {
    let mut remaining = text.to_string();
    let mut items: Option<Vec<String>> = None;

    while let Some(found) = locate_tag(&remaining, tag) {
        let span = capture_span(&remaining, found.end);
        if items.is_none() {
            items = Some(bullet_lines(&remaining[span.clone()]));
        }
        remaining.replace_range(found.start..span.end, "");
    }

    (items.unwrap_or_default(), remaining)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_score_extracted_and_removed() {
        let report = parse_report("[HEALTH_SCORE: 73]\n## Resumen\nTodo estable.");
        assert_eq!(report.health_score, 73);
        assert!(!report.cleaned_prose.contains("HEALTH_SCORE"));
        assert_eq!(report.cleaned_prose, "## Resumen\nTodo estable.");
    }

    #[test]
    fn test_missing_health_score_defaults() {
        assert_eq!(parse_report("Sin etiquetas.").health_score, 85);
    }

    #[test]
    fn test_malformed_health_score_defaults_and_is_removed() {
        let report = parse_report("[HEALTH_SCORE: alto] texto");
        assert_eq!(report.health_score, 85);
        assert_eq!(report.cleaned_prose, "texto");
    }

    #[test]
    fn test_health_score_clamped() {
        assert_eq!(parse_report("[HEALTH_SCORE: 0]").health_score, 1);
        assert_eq!(parse_report("[HEALTH_SCORE: 250]").health_score, 100);
        assert_eq!(parse_report("[HEALTH_SCORE: 99999999999999999999999]").health_score, 100);
    }

    #[test]
    fn test_first_health_score_wins_all_removed() {
        let report = parse_report("[health_score: 40] a [HEALTH_SCORE: 90] b");
        assert_eq!(report.health_score, 40);
        assert_eq!(report.cleaned_prose, "a  b");
    }

    #[test]
    fn test_findings_and_opportunities() {
        let text = "[CRITICAL_FINDINGS]\n- Revenue declined 12%\n- Margin erosion\n[GOLD_OPPORTUNITIES]\n- Expand into APAC\n";
        let report = parse_report(text);
        assert_eq!(report.critical_findings, vec!["Revenue declined 12%", "Margin erosion"]);
        assert_eq!(report.gold_opportunities, vec!["Expand into APAC"]);
        for fragment in [
            "CRITICAL_FINDINGS",
            "GOLD_OPPORTUNITIES",
            "Revenue declined",
            "Margin erosion",
            "Expand into APAC",
        ] {
            assert!(!report.cleaned_prose.contains(fragment), "{fragment} leaked");
        }
        assert!(!report.cleaned_prose.contains('['));
    }

    #[test]
    fn test_full_answer_keeps_prose() {
        let text = "[HEALTH_SCORE: 62]\n\
                    [CRITICAL_FINDINGS]\n- Caja negativa\n\
                    [GOLD_OPPORTUNITIES]\n  -  Subir precios 5%\n\
                    [FIN]\n## Proyecciones\nCrecimiento de 8% a 12 meses.";
        let report = parse_report(text);
        assert_eq!(report.health_score, 62);
        assert_eq!(report.critical_findings, vec!["Caja negativa"]);
        assert_eq!(report.gold_opportunities, vec!["Subir precios 5%"]);
        assert_eq!(report.cleaned_prose, "[FIN]\n## Proyecciones\nCrecimiento de 8% a 12 meses.");
    }

    #[test]
    fn test_section_without_bullets_is_empty_and_removed() {
        let report = parse_report("Intro\n[CRITICAL_FINDINGS]\nnada relevante\n[GOLD_OPPORTUNITIES]\n- Nuevo canal");
        assert!(report.critical_findings.is_empty());
        assert_eq!(report.gold_opportunities, vec!["Nuevo canal"]);
        assert_eq!(report.cleaned_prose, "Intro");
    }

    #[test]
    fn test_sections_in_any_order_and_case() {
        let report = parse_report("[gold_opportunities]\n- A\n[Critical_Findings]\n- B");
        assert_eq!(report.critical_findings, vec!["B"]);
        assert_eq!(report.gold_opportunities, vec!["A"]);
        assert!(report.cleaned_prose.is_empty());
    }

    #[test]
    fn test_duplicate_section_first_wins() {
        let (items, rest) = strip_section(
            "[CRITICAL_FINDINGS]\n- uno\n[CRITICAL_FINDINGS]\n- dos\n",
            SectionTag::CriticalFindings,
        );
        assert_eq!(items, vec!["uno"]);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_phases_individually() {
        let text = "x [CRITICAL_FINDINGS]\n- a\n[NEXT]";
        let tag = locate_tag(text, SectionTag::CriticalFindings).expect("tag present");
        assert_eq!(&text[tag.clone()], "[CRITICAL_FINDINGS]");

        let span = capture_span(text, tag.end);
        assert_eq!(&text[span.clone()], "\n- a\n");
        assert_eq!(span.end, text.len() - "[NEXT]".len());

        assert_eq!(bullet_lines("\n- a\n b\n   -c  \n"), vec!["a", "c"]);
        assert_eq!(capture_span("abc", 1), 1..3);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let text = "[HEALTH_SCORE: 55]\nResumen\n[CRITICAL_FINDINGS]\n- x\n[GOLD_OPPORTUNITIES]\n- y\n[NOTA] final";
        let first = parse_report(text);
        let second = parse_report(&first.cleaned_prose);
        assert!(second.critical_findings.is_empty());
        assert!(second.gold_opportunities.is_empty());
        assert_eq!(second.cleaned_prose, first.cleaned_prose);
    }
}
