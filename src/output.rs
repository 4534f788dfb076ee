use clap::ValueEnum;
use serde::Serialize;
use snuffle_walk::{ContainerKind, Finding, Reason, Report, ReportEvent, RunSummary, WalkEvent};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One human-readable line per finding or notice
    #[default]
    Text,
    /// One JSON object per finding
    Json,
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    resource: &'a str,
    container: &'a str,
    kind: ContainerKind,
    #[serde(flatten)]
    finding: &'a Finding,
}

/// Writes reports to `out` as they arrive.
pub struct Printer<W: Write> {
    format: Format,
    out: W,
}
impl<W: Write> Printer<W> {
    pub fn new(format: Format, out: W) -> Self {
        Self { format, out }
    }

    pub fn report(&mut self, report: &Report) -> io::Result<()> {
        match self.format {
            Format::Text => self.text(report)?,
            Format::Json => self.json(report)?,
        }
        // Findings should show up while a long walk is still going.
        self.out.flush()
    }

    fn text(&mut self, report: &Report) -> io::Result<()> {
        let resource = &report.resource;
        let container = report.container.as_deref().unwrap_or_default();
        match (&report.event, report.kind) {
            (ReportEvent::Empty, ContainerKind::Share) => writeln!(self.out, "{resource}: No shares..."),
            (ReportEvent::Empty, ContainerKind::Bucket) => writeln!(self.out, "{resource}: No buckets..."),
            (ReportEvent::Started, ContainerKind::Share) => writeln!(self.out, "{resource}: Share: {container}"),
            (ReportEvent::Started, ContainerKind::Bucket) => writeln!(self.out, "{resource}: Bucket: {container}"),
            (ReportEvent::Walk(WalkEvent::Finding(finding)), _) => {
                let what = match finding.reason {
                    Reason::Directory => "folder",
                    Reason::Path => "file path",
                    Reason::Name => "file name",
                    Reason::Extension => "file extension",
                };
                writeln!(self.out, "{resource}/{container}: Found interesting {what}! ({})", finding.path)
            },
            (ReportEvent::Walk(WalkEvent::Complete(stats)), _) => {
                tracing::debug!(resource = %resource, container, ?stats, "Container done");
                Ok(())
            },
        }
    }

    fn json(&mut self, report: &Report) -> io::Result<()> {
        let ReportEvent::Walk(WalkEvent::Finding(finding)) = &report.event else {
            return Ok(());
        };
        let line = JsonFinding {
            resource: &report.resource,
            container: report.container.as_deref().unwrap_or_default(),
            kind: report.kind,
            finding,
        };
        serde_json::to_writer(&mut self.out, &line)?;
        writeln!(self.out)
    }

    /// Totals for the run. Text output only; JSON consumers get the same
    /// numbers from the logs.
    pub fn summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let stats = &summary.stats;
        tracing::info!(walks = summary.walks, ?stats, "Run complete");
        if self.format == Format::Text {
            writeln!(
                self.out,
                "Walked {} containers ({} directories): {} entries, {} skipped, {} denied, {} faulted, {} findings{}",
                summary.walks,
                stats.containers,
                stats.entries,
                stats.skipped,
                stats.denied,
                stats.faults,
                stats.findings,
                if stats.cancelled { " (cancelled)" } else { "" },
            )?;
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
