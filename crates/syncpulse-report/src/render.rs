//! 리포트 렌더러 (JSON / HTML / Markdown).

use std::fmt::Write as _;

use syncpulse_core::error::CoreError;
use syncpulse_core::models::report::{Report, ReportFormat};

/// 형식별 렌더링
pub fn render(report: &Report, format: ReportFormat) -> Result<String, CoreError> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        ReportFormat::Html => Ok(render_html(report)),
        ReportFormat::Markdown => Ok(render_markdown(report)),
    }
}

fn signed_i64(delta: Option<i64>) -> String {
    match delta {
        Some(d) => format!(" ({d:+})"),
        None => String::new(),
    }
}

fn signed_f64(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!(" ({d:+.2})"),
        None => String::new(),
    }
}

// ============================================================
// Markdown
// ============================================================

pub fn render_markdown(report: &Report) -> String {
    let s = &report.summary;
    let d = &s.deltas;
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", report.title);
    let _ = writeln!(out, "- 리포트 ID: `{}`", report.id);
    let _ = writeln!(out, "- 생성 시각: {}", report.generated_at.to_rfc3339());
    let _ = writeln!(
        out,
        "- 기간: {} ~ {}\n",
        report.period.start.to_rfc3339(),
        report.period.end.to_rfc3339()
    );

    let _ = writeln!(out, "## 요약\n");
    let _ = writeln!(out, "| 항목 | 값 |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| 총 동기화 | {}{} |", s.total_syncs, signed_i64(d.total_syncs));
    let _ = writeln!(out, "| 성공률 | {:.2}%{} |", s.success_rate, signed_f64(d.success_rate));
    let _ = writeln!(
        out,
        "| 평균 동기화 시간 | {:.2}s{} |",
        s.average_sync_duration_secs,
        signed_f64(d.average_sync_duration_secs)
    );
    let _ = writeln!(out, "| 실패율 | {:.2}%{} |", s.error_rate, signed_f64(d.error_rate));
    let _ = writeln!(
        out,
        "| 기간 내 알림 | {} ({:+}) |",
        s.alerts_in_period, d.alerts_in_period
    );
    let _ = writeln!(
        out,
        "| 처리 커밋 | {}{} |\n",
        s.commits_processed,
        signed_i64(d.commits_processed)
    );

    let _ = writeln!(out, "## 성능\n");
    if report.performance.series.is_empty() {
        let _ = writeln!(out, "수집된 시리즈 없음\n");
    } else {
        let _ = writeln!(out, "| 시리즈 | 샘플 | 평균 | p95 | 최대 | 추세 |");
        let _ = writeln!(out, "|---|---|---|---|---|---|");
        for (name, summary) in &report.performance.series {
            let _ = writeln!(
                out,
                "| {name} | {} | {:.2} | {:.2} | {:.2} | {} |",
                summary.count,
                summary.average,
                summary.p95,
                summary.peak,
                summary.direction.as_str()
            );
        }
        out.push('\n');
    }

    let a = &report.alerts;
    let _ = writeln!(out, "## 알림\n");
    let _ = writeln!(
        out,
        "- 합계: {} (직전 기간 {})\n- 미해결: {} (critical {})",
        a.total, a.previous_period_total, a.unresolved, a.critical_unresolved
    );
    for (kind, count) in &a.by_kind {
        let _ = writeln!(out, "- `{kind}`: {count}");
    }
    out.push('\n');

    let _ = writeln!(out, "## 권고 사항\n");
    if report.recommendations.is_empty() {
        let _ = writeln!(out, "조치가 필요한 항목 없음");
    } else {
        for rec in &report.recommendations {
            let _ = writeln!(out, "- {rec}");
        }
    }
    out
}

// ============================================================
// HTML
// ============================================================

pub fn render_html(report: &Report) -> String {
    let s = &report.summary;
    let d = &s.deltas;
    let mut out = String::new();

    let _ = write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>body{{font-family:sans-serif;margin:24px}}table{{border-collapse:collapse}}\
         td,th{{border:1px solid #ccc;padding:4px 8px;text-align:left}}</style></head><body>",
        title = escape(&report.title)
    );
    let _ = write!(out, "<h1>{}</h1>", escape(&report.title));
    let _ = write!(
        out,
        "<p>{} · {} ~ {}</p>",
        escape(&report.id),
        report.period.start.to_rfc3339(),
        report.period.end.to_rfc3339()
    );

    out.push_str("<h2>요약</h2><table>");
    let rows = [
        ("총 동기화", format!("{}{}", s.total_syncs, signed_i64(d.total_syncs))),
        ("성공률", format!("{:.2}%{}", s.success_rate, signed_f64(d.success_rate))),
        (
            "평균 동기화 시간",
            format!(
                "{:.2}s{}",
                s.average_sync_duration_secs,
                signed_f64(d.average_sync_duration_secs)
            ),
        ),
        ("실패율", format!("{:.2}%{}", s.error_rate, signed_f64(d.error_rate))),
        (
            "기간 내 알림",
            format!("{} ({:+})", s.alerts_in_period, d.alerts_in_period),
        ),
        (
            "처리 커밋",
            format!("{}{}", s.commits_processed, signed_i64(d.commits_processed)),
        ),
    ];
    for (label, value) in rows {
        let _ = write!(out, "<tr><th>{label}</th><td>{}</td></tr>", escape(&value));
    }
    out.push_str("</table>");

    out.push_str("<h2>성능</h2><table><tr><th>시리즈</th><th>샘플</th><th>평균</th><th>p95</th><th>최대</th><th>추세</th></tr>");
    for (name, summary) in &report.performance.series {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{}</td></tr>",
            escape(name),
            summary.count,
            summary.average,
            summary.p95,
            summary.peak,
            summary.direction.as_str()
        );
    }
    out.push_str("</table>");

    let a = &report.alerts;
    let _ = write!(
        out,
        "<h2>알림</h2><p>합계 {} (직전 기간 {}), 미해결 {} (critical {})</p><ul>",
        a.total, a.previous_period_total, a.unresolved, a.critical_unresolved
    );
    for alert in &a.recent {
        let _ = write!(
            out,
            "<li style=\"color:{}\">[{}] {}: {}</li>",
            alert.severity.color(),
            alert.severity,
            escape(&alert.kind),
            escape(&alert.message)
        );
    }
    out.push_str("</ul><h2>권고 사항</h2><ul>");
    for rec in &report.recommendations {
        let _ = write!(out, "<li>{}</li>", escape(rec));
    }
    out.push_str("</ul></body></html>");
    out
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
