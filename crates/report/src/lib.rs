//! Report sink: renders one analysis record into human- and
//! machine-readable artifacts.
//!
//! Rendering is split from writing so the dashboard or tests can reuse the
//! pure render functions. [`ReportWriter`] persists four artifacts per call
//! under `out_dir/<call_id>/`: a role-tagged transcript, a one-row CSV score
//! table, the full JSON record, and a single-page HTML report. A record with
//! zero segments renders fine; the missing transcript is stated, not an
//! error.

use std::fs;
use std::path::{Path, PathBuf};

use callscore_record::{AnalysisRecord, SpeakerRole};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Writes report artifacts under a base output directory.
pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Renders and writes all artifacts for one record, returning the
    /// per-call directory they landed in.
    pub fn write(&self, record: &AnalysisRecord) -> Result<PathBuf> {
        let call_dir = self.out_dir.join(&record.call_id);
        fs::create_dir_all(&call_dir)?;

        fs::write(call_dir.join("transcript.txt"), render_transcript(record))?;
        fs::write(call_dir.join("report.csv"), render_csv(record))?;
        fs::write(
            call_dir.join("analysis.json"),
            serde_json::to_string_pretty(record)?,
        )?;
        fs::write(call_dir.join("report.html"), render_html(record))?;

        tracing::info!(call_id = %record.call_id, dir = %call_dir.display(), "wrote report");
        Ok(call_dir)
    }
}

/// Role-tagged turn rendering. Consecutive segments from the same speaker
/// are grouped into one turn, stamped with the turn's start time.
pub fn render_transcript(record: &AnalysisRecord) -> String {
    if record.transcript.is_empty() {
        return format!("(no speech transcribed for call {})\n", record.call_id);
    }

    let mut lines: Vec<String> = Vec::new();
    let mut turn_role: Option<SpeakerRole> = None;
    let mut turn_start = 0u64;
    let mut turn_text: Vec<&str> = Vec::new();

    for segment in &record.transcript {
        if turn_role == Some(segment.speaker_role) {
            turn_text.push(segment.text.as_str());
            continue;
        }
        if let Some(role) = turn_role {
            lines.push(format_turn(turn_start, role, &turn_text));
        }
        turn_role = Some(segment.speaker_role);
        turn_start = segment.start_ms;
        turn_text = vec![segment.text.as_str()];
    }
    if let Some(role) = turn_role {
        lines.push(format_turn(turn_start, role, &turn_text));
    }

    lines.join("\n") + "\n"
}

fn format_turn(start_ms: u64, role: SpeakerRole, text: &[&str]) -> String {
    format!("[{}] {}: {}", clock(start_ms), role, text.join(" "))
}

fn clock(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// One header row and one data row per record. Score components collapse
/// into a `category=score` list so the column set stays stable as
/// categories come and go.
pub fn render_csv(record: &AnalysisRecord) -> String {
    let header = [
        "call_id",
        "created_at",
        "provider_used",
        "intent",
        "composite_score",
        "failed_flags",
        "scores",
        "amounts",
        "dates",
        "payment_modes",
    ];

    let scores = record
        .scores
        .iter()
        .map(|c| format!("{}={:.1}", c.category, c.normalized_value))
        .collect::<Vec<_>>()
        .join("|");
    let failed = record
        .failed_flags()
        .iter()
        .map(|f| f.flag.to_string())
        .collect::<Vec<_>>()
        .join("|");

    let row = [
        record.call_id.clone(),
        record.created_at.to_rfc3339(),
        record.provider_used.clone(),
        record.intent.to_string(),
        format!("{:.1}", record.composite_score),
        failed,
        scores,
        record.entities.amounts.join("|"),
        record.entities.dates.join("|"),
        record.entities.payment_modes.join("|"),
    ];

    let mut csv = header.join(",");
    csv.push('\n');
    csv.push_str(
        &row.iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(","),
    );
    csv.push('\n');
    csv
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Single-page HTML report: metadata, compliance flags, score table,
/// extracted entities, and the turn-grouped transcript.
pub fn render_html(record: &AnalysisRecord) -> String {
    let flags = if record.compliance_flags.is_empty() {
        "<li>-</li>".to_string()
    } else {
        record
            .compliance_flags
            .iter()
            .map(|f| {
                format!(
                    "<li>{}: <b>{}</b></li>",
                    escape_html(&f.flag.to_string()),
                    if f.passed { "pass" } else { "FAIL" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let score_rows = if record.scores.is_empty() {
        "<tr><td colspan=\"4\">no scorable categories</td></tr>".to_string()
    } else {
        record
            .scores
            .iter()
            .map(|c| {
                format!(
                    "<tr><td>{}</td><td>{:.3}</td><td>{:.2}</td><td>{:.1}</td></tr>",
                    escape_html(&c.category.to_string()),
                    c.raw_value,
                    c.weight,
                    c.normalized_value
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<html>
<head>
    <meta charset="utf-8">
    <title>Call Analysis - {call_id}</title>
</head>
<body>
<h1>Call Analysis Report</h1>
<p><b>Call:</b> {call_id}</p>
<p><b>Created:</b> {created_at}</p>
<p><b>Provider:</b> {provider}</p>
<p><b>Duration:</b> {duration}</p>

<h2>Intent: {intent}</h2>
<h2>Composite score: {composite:.1}</h2>

<h3>Compliance flags</h3>
<ul>
{flags}
</ul>

<h3>Scores</h3>
<table border="1" cellpadding="4">
<tr><th>category</th><th>raw</th><th>weight</th><th>score</th></tr>
{score_rows}
</table>

<h3>Entities</h3>
<ul>
<li>Amounts: {amounts}</li>
<li>Dates: {dates}</li>
<li>Payment modes: {modes}</li>
</ul>

<h3>Transcript</h3>
<pre style="white-space: pre-wrap; font-family: monospace;">
{transcript}
</pre>
</body>
</html>
"#,
        call_id = escape_html(&record.call_id),
        created_at = record.created_at.to_rfc3339(),
        provider = escape_html(&record.provider_used),
        duration = clock(record.call_duration_ms),
        intent = record.intent,
        composite = record.composite_score,
        flags = flags,
        score_rows = score_rows,
        amounts = list_or_dash(&record.entities.amounts),
        dates = list_or_dash(&record.entities.dates),
        modes = list_or_dash(&record.entities.payment_modes),
        transcript = escape_html(&render_transcript(record)),
    )
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        escape_html(&items.join(", "))
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscore_record::{
        ComplianceFlag, FlagKind, RecordBuilder, ScoreComponent, ScoreSummary, SignalCategory,
        TranscriptSegment,
    };

    fn seg(start_ms: u64, end_ms: u64, role: SpeakerRole, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start_ms,
            end_ms,
            speaker_role: role,
            speaker_label: None,
            text: text.to_string(),
        }
    }

    fn sample_record() -> AnalysisRecord {
        RecordBuilder::new("calls/call_0042.wav", "mock", "2025-03-01T10:00:00Z".parse().unwrap())
            .transcript(vec![
                seg(0, 4000, SpeakerRole::Agent, "Hello, this call is recorded."),
                seg(4200, 6000, SpeakerRole::Agent, "Am I speaking with Mr. Rao?"),
                seg(6500, 8000, SpeakerRole::Customer, "Yes, speaking."),
            ])
            .scores(ScoreSummary {
                components: vec![ScoreComponent {
                    category: SignalCategory::Disclosure,
                    raw_value: 1.0,
                    weight: 1.0,
                    normalized_value: 100.0,
                }],
                composite_score: 100.0,
                flags: vec![ComplianceFlag {
                    flag: FlagKind::Disclosure,
                    passed: true,
                }],
            })
            .build()
            .unwrap()
    }

    fn empty_record() -> AnalysisRecord {
        RecordBuilder::new("dropped.wav", "mock", "2025-03-01T10:00:00Z".parse().unwrap())
            .transcript(Vec::new())
            .scores(ScoreSummary {
                components: Vec::new(),
                composite_score: 0.0,
                flags: vec![ComplianceFlag {
                    flag: FlagKind::Scorable,
                    passed: false,
                }],
            })
            .build()
            .unwrap()
    }

    #[test]
    fn transcript_groups_consecutive_same_role_segments() {
        let text = render_transcript(&sample_record());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "[00:00] agent: Hello, this call is recorded. Am I speaking with Mr. Rao?"
        );
        assert_eq!(lines[1], "[00:06] customer: Yes, speaking.");
    }

    #[test]
    fn transcript_tolerates_zero_segments() {
        let text = render_transcript(&empty_record());
        assert!(text.contains("no speech transcribed"));
        assert!(text.contains("dropped"));
    }

    #[test]
    fn csv_has_header_and_matching_row() {
        let csv = render_csv(&sample_record());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("call_id,created_at,provider_used"));
        assert!(lines[1].starts_with("call_0042,"));
        assert!(lines[1].contains("disclosure=100.0"));
        assert_eq!(lines[0].split(',').count(), 10);
    }

    #[test]
    fn csv_escapes_embedded_commas() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn html_carries_flags_and_transcript() {
        let html = render_html(&sample_record());
        assert!(html.contains("<title>Call Analysis - call_0042</title>"));
        assert!(html.contains("Call Analysis Report"));
        assert!(html.contains("disclosure: <b>pass</b>"));
        assert!(html.contains("this call is recorded"));

        let html = render_html(&empty_record());
        assert!(html.contains("scorable: <b>FAIL</b>"));
        assert!(html.contains("no scorable categories"));
    }

    #[test]
    fn writer_emits_all_four_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let call_dir = writer.write(&sample_record()).unwrap();
        assert_eq!(call_dir, dir.path().join("call_0042"));
        for name in ["transcript.txt", "report.csv", "analysis.json", "report.html"] {
            assert!(call_dir.join(name).is_file(), "missing {name}");
        }

        let json = std::fs::read_to_string(call_dir.join("analysis.json")).unwrap();
        let back: AnalysisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_record());
    }

    #[test]
    fn writer_tolerates_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let call_dir = ReportWriter::new(dir.path()).write(&empty_record()).unwrap();
        assert!(call_dir.join("transcript.txt").is_file());
    }
}
