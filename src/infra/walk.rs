//! Filepath: src/infra/walk.rs
//! Gitignore-aware walker that collects Java sources.
//! - Respects .gitignore, .git/info/exclude, and global gitignore
//! - Extra ignore globs (early prune + late filter)
//! - Restricted to the `java` file type
//! - Explicit file arguments bypass ignore rules
//! - Deterministic ordering for stable tests/CI
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{
    DirEntry, WalkBuilder,
    types::{Types, TypesBuilder},
};
use tracing::debug;

/// Gitignore-aware walker over `.java` files.
/// Extra globs are applied in two places:
///   1) Early: prune directories during traversal (filter_entry).
///   2) Late: filter out files that still slipped through.
pub struct FileWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// `java` file type matcher
    file_types: Types,

    /// Include hidden (dot) files; default false
    include_hidden: bool,
}

impl FileWalker
{
    /// Build a walker with additional ignore patterns (e.g., "target/**",
    /// "build/**"). Patterns match on (relative) paths.
    pub fn new(additional_ignores: &[String]) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        let mut tb = TypesBuilder::new();
        tb.add_defaults();
        tb.select("java");

        Ok(Self {
            ignore_patterns: builder.build()?,
            file_types: tb.build()?,
            include_hidden: false,
        })
    }

    /// (Optional) Include or exclude hidden files (dotfiles).
    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    /// Internal: construct a configured WalkBuilder for `root`.
    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // WalkBuilder::hidden(true) skips dotfiles
        b.hidden(!self.include_hidden);

        // Respect .ignore/.gitignore/.git/info/exclude and global gitignore
        b.git_ignore(true);
        b.git_global(true);
        b.git_exclude(true);

        // Early directory pruning using extra ignores, relative to the root
        let extra = self
            .ignore_patterns
            .clone();
        let base = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);

            let rel = ent
                .path()
                .strip_prefix(&base)
                .unwrap_or(ent.path());
            !(is_dir && (extra.is_match(rel) || extra.is_match(rel.join("_"))))
        });

        b.types(self.file_types.clone());

        b
    }

    /// Java files under `root`, sorted.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Vec<PathBuf>
    {
        let root_path = root.as_ref();
        let walker = self
            .build_walk(root_path)
            .build();

        let mut out: Vec<PathBuf> = walker
            .filter_map(|res| match res
            {
                Ok(entry) => Some(entry),
                Err(err) =>
                {
                    debug!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .map(|entry| entry.into_path())
            // Late file-level extra ignore filtering using RELATIVE path
            .filter(|abs| {
                let rel = abs
                    .strip_prefix(root_path)
                    .unwrap_or(abs);
                !self
                    .ignore_patterns
                    .is_match(rel)
            })
            .collect();

        out.sort();
        out
    }

    /// Expand command-line paths: directories are walked, files kept as given.
    /// The result is sorted and free of duplicates.
    pub fn java_sources(
        &self,
        paths: &[PathBuf],
    ) -> Vec<PathBuf>
    {
        let mut out = Vec::new();
        for path in paths
        {
            if path.is_dir()
            {
                out.extend(self.walk_files(path));
            }
            else if path
                .extension()
                .is_some_and(|e| e == "java")
            {
                out.push(path.clone());
            }
            else
            {
                debug!(path = %path.display(), "not a directory or .java file; skipped");
            }
        }
        out.sort();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    /// Create a file with parent dirs as needed
    fn write_file(
        root: &Path,
        rel: &str,
        contents: &str,
    ) -> Result<()>
    {
        let path = root.join(rel);
        if let Some(parent) = path.parent()
        {
            std::fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn relative(
        root: &Path,
        files: Vec<PathBuf>,
    ) -> Vec<PathBuf>
    {
        files
            .into_iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_path_buf()
            })
            .collect()
    }

    #[test]
    fn test_only_java_files_sorted() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, "src/b/B.java", "class B {}")?;
        write_file(root, "src/a/A.java", "class A {}")?;
        write_file(root, "README.md", "# Test")?;

        let walker = FileWalker::new(&[])?;
        let files = relative(root, walker.walk_files(root));

        assert_eq!(
            files,
            vec![PathBuf::from("src/a/A.java"), PathBuf::from("src/b/B.java")]
        );
        Ok(())
    }

    #[test]
    fn test_additional_globs_prune_and_filter() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, "target/gen/Gen.java", "class Gen {}")?;
        write_file(root, "build/Out.java", "class Out {}")?;
        write_file(root, "src/Main.java", "class Main {}")?;

        let ignores = vec!["target/**".to_string(), "build/**".to_string()];
        let walker = FileWalker::new(&ignores)?;
        let files = relative(root, walker.walk_files(root));

        assert_eq!(files, vec![PathBuf::from("src/Main.java")]);
        Ok(())
    }

    #[test]
    fn test_hidden_files_skipped_by_default() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, ".cache/Hidden.java", "class Hidden {}")?;
        write_file(root, "Visible.java", "class Visible {}")?;

        let files = relative(root, FileWalker::new(&[])?.walk_files(root));
        assert_eq!(files, vec![PathBuf::from("Visible.java")]);

        let files = relative(
            root,
            FileWalker::new(&[])?
                .with_include_hidden(true)
                .walk_files(root),
        );
        assert!(files.contains(&PathBuf::from(".cache/Hidden.java")));
        Ok(())
    }

    #[test]
    fn test_explicit_files_and_dirs_merge() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, "pkg/A.java", "class A {}")?;
        write_file(root, "notes.txt", "n")?;

        let walker = FileWalker::new(&[])?;
        let files = walker.java_sources(&[
            root.join("pkg"),
            root.join("pkg/A.java"),
            root.join("notes.txt"),
        ]);
        assert_eq!(files, vec![root.join("pkg/A.java")]);
        Ok(())
    }
}
