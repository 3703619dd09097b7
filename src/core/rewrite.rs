//! `fix` and `annotate` commands.
//!
//! Both preview a unified diff by default and write with `--apply`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use rayon::prelude::*;
use similar::{ChangeTag, TextDiff};
use tracing::{info, instrument, warn};

use crate::{
    cli::{AnnotateArgs, AppContext, FixArgs, parse_position},
    core::{
        analyzer::CallSiteAnalyzer,
        check::progress_bar,
        engine::{Project, SourceFile, Workspace},
        errors::EngineError,
        fix::{ArgumentRef, CommentFixApplier, JavaDocument},
        intention::annotate_at,
        resolve::CallResolver,
    },
    infra::io::write_atomic,
};

/// Annotate every flagged argument of `doc`. Returns how many fixes were applied.
///
/// Each round re-analyzes and fixes the last flagged argument, so the
/// reformat of one call never invalidates a pending offset.
pub fn fix_all<R: CallResolver + ?Sized>(
    doc: &mut JavaDocument<'_>,
    analyzer: &CallSiteAnalyzer<'_, R>,
    applier: &CommentFixApplier<'_>,
) -> Result<usize, EngineError> {
    let mut budget = analyzer.analyze_tree(doc.tree(), doc.source().as_bytes()).len();
    let mut applied = 0usize;

    loop {
        let next = analyzer
            .analyze_tree(doc.tree(), doc.source().as_bytes())
            .last()
            .map(|f| (ArgumentRef::of(f.slot.expr), f.parameter.clone()));
        let Some((arg, parameter)) = next else { break };
        if budget == 0 {
            warn!(start = arg.start, "fix did not converge; remaining findings left in place");
            break;
        }
        budget -= 1;
        applier.apply(doc, arg, &parameter)?;
        applied += 1;
    }
    Ok(applied)
}

/// A file whose text the fix changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedFile {
    pub path: PathBuf,
    pub before: String,
    pub after: String,
    pub fixes: usize,
}

/// Run `fix` over every file in parallel, keeping the ones it changed,
/// sorted by path. A file that fails is logged and left as it was.
pub fn fix_files<F>(files: &[SourceFile], fix: F) -> Vec<FixedFile>
where
    F: Fn(&SourceFile) -> Result<(String, usize), EngineError> + Sync,
{
    let mut changed: Vec<FixedFile> = files
        .par_iter()
        .filter_map(|file| match fix(file) {
            Ok((_, 0)) => None,
            Ok((after, fixes)) => Some(FixedFile {
                path: file.path.clone(),
                before: file.text.clone(),
                after,
                fixes,
            }),
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "fix failed; file skipped");
                None
            }
        })
        .collect();
    changed.sort_by(|a, b| a.path.cmp(&b.path));
    changed
}

/// `fix`: annotate every finding under `args.paths`.
#[instrument(skip_all)]
pub fn fix_run(args: FixArgs, ctx: &AppContext) -> Result<()> {
    let ws = Workspace::load(ctx)?;
    let files = ws.java_sources(&args.paths)?;
    let settings = ws.settings(ctx)?;

    let progress = progress_bar(files.len(), ctx);
    let project = Project::load(&ws.engine, &files, &progress)?;
    progress.finish_and_clear();

    let analyzer = ws.engine.analyzer(&project.index);
    let applier = CommentFixApplier::new(&settings);

    let changed = fix_files(&project.files, |file| {
        let mut doc = JavaDocument::parse(ws.engine.parser(), file.text.clone())?;
        let count = fix_all(&mut doc, &analyzer, &applier)?;
        Ok((doc.into_source(), count))
    });

    let total: usize = changed.iter().map(|c| c.fixes).sum();
    for file in &changed {
        if args.apply {
            write_atomic(&file.path, file.after.as_bytes())?;
            info!(path = %file.path.display(), fixes = file.fixes, "file rewritten");
        } else {
            print_diff(&file.path, &file.before, &file.after, ctx);
        }
    }

    if !ctx.quiet {
        let verb = if args.apply { "Applied" } else { "Would apply" };
        println!("{verb} {total} fix(es) in {} file(s)", changed.len());
    }
    Ok(())
}

/// `annotate`: cursor intention on one file.
#[instrument(skip_all)]
pub fn annotate_run(args: AnnotateArgs, ctx: &AppContext) -> Result<()> {
    let (file, line, column) = parse_position(&args.position)
        .with_context(|| format!("Invalid position '{}' (expected File.java:LINE:COL)", args.position))?;

    let ws = Workspace::load(ctx)?;
    let target = dunce::canonicalize(&file)
        .with_context(|| format!("Failed to resolve {}", file.display()))?;

    // Index the root for declarations, plus the target itself
    let mut files: Vec<PathBuf> = ws
        .java_sources(&[args.root.clone()])?
        .into_iter()
        .filter_map(|p| dunce::canonicalize(p).ok())
        .collect();
    files.push(target.clone());
    files.sort();
    files.dedup();

    let progress = progress_bar(files.len(), ctx);
    let project = Project::load(&ws.engine, &files, &progress)?;
    progress.finish_and_clear();

    let source = project
        .file(&target)
        .map(|f| f.text.clone())
        .with_context(|| format!("{} was not loaded", target.display()))?;

    let settings = ws.settings(ctx)?;
    let applier = CommentFixApplier::new(&settings);
    let mut doc = JavaDocument::parse(ws.engine.parser(), source.clone())?;
    let (annotated, _) = annotate_at(&mut doc, &project.index, &applier, line, column)?;
    let after = doc.into_source();

    if args.apply {
        write_atomic(&target, after.as_bytes())?;
    } else {
        print_diff(&file, &source, &after, ctx);
    }
    if !ctx.quiet {
        println!(
            "Annotated argument {} of {} with `{}`",
            annotated.index, annotated.callable, annotated.parameter
        );
    }
    Ok(())
}

/// Unified diff of one file, coloured unless `--no-color`.
fn print_diff(path: &Path, before: &str, after: &str, ctx: &AppContext) {
    let name = path.display().to_string();
    let diff = TextDiff::from_lines(before, after);

    println!("--- a/{name}");
    println!("+++ b/{name}");
    for hunk in diff.unified_diff().context_radius(2).iter_hunks() {
        println!("{}", hunk.header());
        for change in hunk.iter_changes() {
            let (sign, text) = match change.tag() {
                ChangeTag::Delete => ("-", change.to_string_lossy()),
                ChangeTag::Insert => ("+", change.to_string_lossy()),
                ChangeTag::Equal => (" ", change.to_string_lossy()),
            };
            let line = format!("{sign}{}", text.trim_end_matches('\n'));
            match (ctx.no_color, change.tag()) {
                (false, ChangeTag::Delete) => println!("{}", line.red()),
                (false, ChangeTag::Insert) => println!("{}", line.green()),
                _ => println!("{line}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{engine::Engine, template::TemplateSettings},
        infra::settings::MemorySettings,
    };

    fn fix_source(src: &str) -> (String, usize) {
        let engine = Engine::new().unwrap();
        let project = Project::from_sources(&engine, vec![(PathBuf::from("T.java"), src.to_string())]).unwrap();
        let settings = MemorySettings::new();
        let mut doc = JavaDocument::parse(engine.parser(), src).unwrap();
        let count = fix_all(&mut doc, &engine.analyzer(&project.index), &CommentFixApplier::new(&settings)).unwrap();
        (doc.into_source(), count)
    }

    #[test]
    fn all_three_literals_get_their_names() {
        let (out, count) = fix_source("class T {\n  void f(int a, int b, int c) {}\n  void g() { f(1, 2, 3); }\n}\n");
        assert_eq!(count, 3);
        assert!(out.contains("f(/* a= */ 1, /* b= */ 2, /* c= */ 3);"), "{out}");
    }

    #[test]
    fn nested_and_constructor_calls_are_fixed() {
        let src = "class T {\n  T(int size, boolean grow) {}\n  int f(int a, int b) { return a; }\n  \
                   void g() { f(f(1, 2), 3); new T(4, false); }\n}\n";
        let (out, count) = fix_source(src);
        assert_eq!(count, 5);
        assert!(out.contains("f(f(/* a= */ 1, /* b= */ 2), /* b= */ 3);"), "{out}");
        assert!(out.contains("new T(/* size= */ 4, /* grow= */ false);"), "{out}");
    }

    #[test]
    fn second_run_changes_nothing() {
        let (once, _) = fix_source("class T {\n  void f(int a, int b) {}\n  void g() { f( 1 ,2 ); }\n}\n");
        let (twice, count) = fix_source(&once);
        assert_eq!(count, 0);
        assert_eq!(once, twice);
        assert!(once.contains("f(/* a= */ 1, /* b= */ 2);"), "{once}");
    }

    #[test]
    fn failing_file_is_skipped_and_the_rest_fixed() {
        let engine = Engine::new().unwrap();
        let ok = "class T {\n  void f(int a, int b) {}\n  void g() { f(1, 2); }\n}\n";
        let project = Project::from_sources(
            &engine,
            vec![(PathBuf::from("Bad.java"), ok.to_string()), (PathBuf::from("T.java"), ok.to_string())],
        )
        .unwrap();
        let settings = MemorySettings::new();
        let applier = CommentFixApplier::new(&settings);
        let analyzer = engine.analyzer(&project.index);

        let changed = fix_files(&project.files, |file| {
            if file.path == Path::new("Bad.java") {
                return Err(EngineError::Parse("unreadable".to_string()));
            }
            let mut doc = JavaDocument::parse(engine.parser(), file.text.clone())?;
            let count = fix_all(&mut doc, &analyzer, &applier)?;
            Ok((doc.into_source(), count))
        });

        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].path, PathBuf::from("T.java"));
        assert_eq!(changed[0].fixes, 2);
        assert!(changed[0].after.contains("f(/* a= */ 1, /* b= */ 2);"));
    }

    #[test]
    fn custom_template_flows_through_fix_all() {
        let src = "class T {\n  void f(int a, int b) {}\n  void g() { f(1, 2); }\n}\n";
        let engine = Engine::new().unwrap();
        let project = Project::from_sources(&engine, vec![(PathBuf::from("T.java"), src.to_string())]).unwrap();
        let settings = MemorySettings::new();
        let applier = CommentFixApplier::new(&settings);
        assert!(applier.set_comment_template("/*%s:*/"));

        let mut doc = JavaDocument::parse(engine.parser(), src).unwrap();
        fix_all(&mut doc, &engine.analyzer(&project.index), &applier).unwrap();
        assert!(doc.source().contains("f(/*a:*/ 1, /*b:*/ 2);"));
    }
}
