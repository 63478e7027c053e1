//! Report rendering and CI thresholds

use anyhow::Result;
use console::style;
use std::fmt::Write as _;

use classlens::scoring::QualityScorer;
use classlens::{AnalysisResult, Analyzer, IssueSummary, Severity};

/// Issues shown in the text report
const TOP_ISSUES: usize = 15;

pub(super) fn render_json(result: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

fn styled_grade(grade: &str) -> String {
    let s = style(grade).bold();
    match grade.chars().next() {
        Some('A') | Some('B') => s.green(),
        Some('C') => s.yellow(),
        _ => s.red(),
    }
    .to_string()
}

fn severity_tag(severity: Severity) -> String {
    match severity {
        Severity::Critical => style("[C]").red().bold(),
        Severity::High => style("[H]").red(),
        Severity::Medium => style("[M]").yellow(),
        Severity::Low => style("[L]").blue(),
    }
    .to_string()
}

pub(super) fn render_text(result: &AnalysisResult, explain: bool, analyzer: &Analyzer) -> String {
    let mut out = String::new();
    let score = &result.score;

    let _ = writeln!(out, "\n{}", style("classlens analysis").bold());
    let _ = writeln!(out, "{}", style("──────────────────────────────────────").dim());
    let _ = writeln!(
        out,
        "Score: {}  Grade: {}  Types: {}  Methods: {}  Packages: {}\n",
        style(format!("{:.1}/100", score.overall)).bold(),
        styled_grade(&score.grade),
        result.class_metrics.len(),
        result.method_metrics.len(),
        result.package_metrics.len()
    );

    let _ = writeln!(out, "{}", style("SCORES").bold());
    let _ = writeln!(
        out,
        "  Structure: {:.1}  Quality: {:.1}  Architecture: {:.1}\n",
        score.structure.score, score.quality.score, score.architecture.score
    );

    let s = &result.summary;
    let _ = writeln!(out, "{} ({} total)", style("ISSUES").bold(), s.total);
    let mut parts = Vec::new();
    if s.critical > 0 {
        parts.push(style(format!("{} critical", s.critical)).red().bold().to_string());
    }
    if s.high > 0 {
        parts.push(style(format!("{} high", s.high)).red().to_string());
    }
    if s.medium > 0 {
        parts.push(style(format!("{} medium", s.medium)).yellow().to_string());
    }
    if s.low > 0 {
        parts.push(style(format!("{} low", s.low)).blue().to_string());
    }
    if !parts.is_empty() {
        let _ = writeln!(out, "  {}", parts.join(" | "));
    }
    out.push('\n');

    for issue in result.issues.iter().take(TOP_ISSUES) {
        let _ = writeln!(
            out,
            "  {}  {:<44}  {}",
            severity_tag(issue.severity),
            issue.title,
            style(&issue.location).dim()
        );
    }
    let remaining = result.issues.len().saturating_sub(TOP_ISSUES);
    if remaining > 0 {
        let _ = writeln!(
            out,
            "\n  {}",
            style(format!("...and {} more (use --format json for all)", remaining)).dim()
        );
    }

    if !result.cycles.is_empty() {
        let _ = writeln!(out, "\n{} ({})", style("CYCLES").bold(), result.cycles.len());
        for cycle in result.cycles.iter().take(5) {
            let first = cycle.first().map_or("", String::as_str);
            let _ = writeln!(out, "  {} -> {}", cycle.join(" -> "), first);
        }
    }

    if !result.errors.is_empty() || !result.warnings.is_empty() {
        let _ = writeln!(
            out,
            "\n{} {} not analyzed, {} warnings",
            style("!").yellow().bold(),
            result.errors.len(),
            result.warnings.len()
        );
        for e in result.errors.iter().take(5) {
            let _ = writeln!(out, "  {}", style(e).dim());
        }
    }

    if explain {
        let scorer = QualityScorer::new(&analyzer.context().config.scoring);
        let _ = writeln!(out, "\n{}", scorer.explain(score));
    }
    out.push('\n');
    out
}

/// Whether any issue is at or above `fail_on`
pub(super) fn exceeds_threshold(fail_on: Option<&str>, summary: &IssueSummary) -> bool {
    match fail_on.and_then(|t| t.parse::<Severity>().ok()) {
        Some(threshold) => summary.at_or_above(threshold) > 0,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        let summary = IssueSummary {
            critical: 0,
            high: 0,
            medium: 2,
            low: 1,
            total: 3,
        };
        assert!(!exceeds_threshold(None, &summary));
        assert!(!exceeds_threshold(Some("high"), &summary));
        assert!(exceeds_threshold(Some("medium"), &summary));
        assert!(exceeds_threshold(Some("low"), &summary));
    }

    #[test]
    fn test_text_report_mentions_grade_and_cycles() {
        use classlens::bytecode::{CallKind, InstructionEvent, InstructionSummary};
        use classlens::classfile::{MemberModel, TypeKind, TypeModel};
        use classlens::{AnalysisContext, PrefixPolicy};

        let calling = |name: &str, target: &str| {
            let summary = InstructionSummary::from_events(vec![InstructionEvent::Call {
                owner: Some(target.to_string()),
                name: "run".into(),
                descriptor: "()V".into(),
                kind: CallKind::Virtual,
            }]);
            TypeModel::new(name, TypeKind::Class)
                .with_method(MemberModel::method("go", "()V").with_instructions(summary))
        };
        let analyzer = Analyzer::new(AnalysisContext::new().with_policy(PrefixPolicy::default()));
        let result = analyzer
            .run(vec![calling("a.A", "a.B"), calling("a.B", "a.A")])
            .unwrap();
        let text = console::strip_ansi_codes(&render_text(&result, true, &analyzer)).to_string();
        assert!(text.contains("Grade: "));
        assert!(text.contains("a.A -> a.B -> a.A"));
        assert!(text.contains("Quality score: "));
    }
}
