//! `check` and `rules` commands.

use std::io::{self, Write};

use anyhow::{Context, Result};
use ariadne::{Color, Config as ReportConfig, IndexType, Label, Report, ReportKind, Source};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use owo_colors::OwoColorize;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::{
    cli::{AppContext, CheckArgs, OutputFormat},
    core::engine::{Finding, Project, Workspace},
};

/// Scan `args.paths` and print findings. Returns how many were reported.
#[instrument(skip_all)]
pub fn run(args: CheckArgs, ctx: &AppContext) -> Result<usize> {
    let ws = Workspace::load(ctx)?;
    let files = ws.java_sources(&args.paths)?;

    let progress = progress_bar(files.len(), ctx);
    let project = Project::load(&ws.engine, &files, &progress)?;
    progress.finish_and_clear();

    let findings = project.findings(&ws.engine);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&findings)?)?;
        }
        OutputFormat::Jsonl => {
            for f in &findings {
                writeln!(out, "{}", serde_json::to_string(f)?)?;
            }
        }
        OutputFormat::Text => {
            for f in &findings {
                let text = project
                    .file(&f.file)
                    .map(|s| s.text.as_str())
                    .unwrap_or_default();
                render_report(f, text, !ctx.no_color, &mut out)?;
            }
            if !ctx.quiet {
                summary(&findings, files.len(), ctx, &mut out)?;
            }
        }
    }
    Ok(findings.len())
}

/// Progress over file reading; hidden when quiet.
pub(crate) fn progress_bar(len: usize, ctx: &AppContext) -> ProgressBar {
    if ctx.quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("reading sources");
    pb
}

/// One labelled snippet per finding.
pub fn render_report<W: Write>(finding: &Finding, source: &str, color: bool, out: &mut W) -> Result<()> {
    let id = finding.file.display().to_string();
    let span = finding.start..finding.end;

    Report::build(ReportKind::Warning, (id.clone(), span.clone()))
        .with_config(
            ReportConfig::default()
                .with_color(color)
                .with_index_type(IndexType::Byte),
        )
        .with_message(&finding.message)
        .with_label(
            Label::new((id.clone(), span))
                .with_message(format!("fills parameter `{}`", finding.parameter))
                .with_color(Color::Yellow),
        )
        .with_note(format!("callable: {}", finding.signature))
        .with_help(format!("insert a parameter comment: argnote annotate {}:{}:{}", id, finding.line, finding.column))
        .finish()
        .write((id, Source::from(source)), &mut *out)
        .context("Failed to render report")?;
    Ok(())
}

fn summary<W: Write>(findings: &[Finding], scanned: usize, ctx: &AppContext, out: &mut W) -> Result<()> {
    let files = findings.iter().map(|f| &f.file).unique().count();
    let line = format!(
        "{} finding(s) in {} of {} file(s)",
        findings.len(),
        files,
        scanned
    );
    if ctx.no_color {
        writeln!(out, "{line}")?;
    } else if findings.is_empty() {
        writeln!(out, "{}", line.green())?;
    } else {
        writeln!(out, "{}", line.yellow().bold())?;
    }
    Ok(())
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "#")]
    order: usize,
    kind: &'static str,
    pattern: String,
}

/// `rules`: effective blacklist (in evaluation order), exempt types, and stubs.
pub fn rules(ctx: &AppContext) -> Result<()> {
    let ws = Workspace::load(ctx)?;
    let engine = &ws.engine;

    let mut rows: Vec<RuleRow> = engine
        .blacklist()
        .rules()
        .enumerate()
        .map(|(i, p)| RuleRow { order: i + 1, kind: "blacklist", pattern: p.to_string() })
        .collect();
    rows.extend(
        engine
            .classifier()
            .exempt_types()
            .sorted()
            .map(|t| RuleRow { order: 0, kind: "exempt type", pattern: t.to_string() }),
    );
    rows.extend(
        ws.config
            .rules
            .signatures
            .iter()
            .map(|s| RuleRow { order: 0, kind: "signature", pattern: s.clone() }),
    );

    println!("{}", Table::new(rows));
    if !ctx.quiet {
        let note = "Calls with fewer than two parameters are always exempt.";
        if ctx.no_color {
            println!("{note}");
        } else {
            println!("{}", note.dimmed());
        }
    }
    Ok(())
}
