//! Display annotation of cleaned prose.
//!
//! Produces the HTML fragment the front-end drops into the report paper.
//! Work is done line by line: escape, mark data points, apply emphasis, then
//! wrap headings. Markup added by an earlier step is never rescanned by a
//! later one, so class attributes stay intact.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::parsing::ParsedReport;

const DATA_POINT_TITLE: &str = "Dato extraído del análisis de archivos fuente.";

const H1_CLASS: &str = "text-3xl font-bold mb-6 text-[#05070A]";
const H2_CLASS: &str = "text-xl font-bold mt-8 mb-4 border-l-4 border-[#00F2FF] pl-4";
const H3_CLASS: &str = "text-lg font-bold mt-6 mb-2";

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d+(?:\.\d+)?%?").unwrap_or_else(|e| unreachable!("number pattern must compile: {e}"))
    })
}

fn bold_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*(.+?)\*\*").unwrap_or_else(|e| unreachable!("bold pattern must compile: {e}"))
    })
}

fn italic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*(.+?)\*").unwrap_or_else(|e| unreachable!("italic pattern must compile: {e}"))
    })
}

/// Escape text for use inside HTML element content.
///
/// The entity set contains no digits, so data-point marking can run after it.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn mark_data_points(text: &str) -> String {
    number_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            format!(
                "<span class=\"data-trace-highlight\" title=\"{DATA_POINT_TITLE}\">{}</span>",
                &caps[0]
            )
        })
        .into_owned()
}

fn apply_emphasis(text: &str) -> String {
    let bold = bold_regex().replace_all(text, "<strong>$1</strong>");
    italic_regex().replace_all(&bold, "<em>$1</em>").into_owned()
}

fn split_heading(line: &str) -> (Option<(&'static str, &'static str)>, &str) {
    if let Some(rest) = line.strip_prefix("### ") {
        (Some(("h3", H3_CLASS)), rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        (Some(("h2", H2_CLASS)), rest)
    } else if let Some(rest) = line.strip_prefix("# ") {
        (Some(("h1", H1_CLASS)), rest)
    } else {
        (None, line)
    }
}

fn annotate_line(line: &str) -> String {
    let (heading, body) = split_heading(line);
    let body = apply_emphasis(&mark_data_points(&escape_html(body)));
    match heading {
        Some((tag, class)) => format!("<{tag} class=\"{class}\">{body}</{tag}>"),
        None => body,
    }
}

/// Annotate cleaned prose: headings, data points, emphasis, `<br>` line breaks.
pub fn annotate_prose(prose: &str) -> String {
    prose.split('\n').map(annotate_line).collect::<Vec<_>>().join("<br>")
}

fn insight_card(item: &str, critical: bool) -> String {
    let (tone, badge, label) = if critical {
        ("red", "badge-critical", "Crítico")
    } else {
        ("green", "badge-opportunity", "Oportunidad")
    };
    format!(
        "<div class=\"insight-card border-{tone}-500 bg-{tone}-50/50\"><span class=\"{badge} mb-1 inline-block\">{label}</span><p class=\"text-xs text-{tone}-900\">{}</p></div>",
        escape_html(item)
    )
}

fn card_column(items: &[String], critical: bool) -> String {
    let cards: String = items.iter().map(|item| insight_card(item, critical)).collect();
    format!("<div class=\"space-y-2\">{cards}</div>")
}

/// Full report fragment: insight cards (when any) followed by the annotated prose.
pub fn render_report(report: &ParsedReport) -> String {
    let mut html = String::new();

    if !report.critical_findings.is_empty() || !report.gold_opportunities.is_empty() {
        html.push_str("<div class=\"grid grid-cols-2 gap-4 mb-8\">");
        if !report.critical_findings.is_empty() {
            html.push_str(&card_column(&report.critical_findings, true));
        }
        if !report.gold_opportunities.is_empty() {
            html.push_str(&card_column(&report.gold_opportunities, false));
        }
        html.push_str("</div>");
    }

    html.push_str("<div class=\"prose max-w-none text-slate-900\">");
    html.push_str(&annotate_prose(&report.cleaned_prose));
    html.push_str("</div>");
    html
}
