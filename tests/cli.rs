use argnote::cli::{
    AnnotateArgs, CheckArgs, Cli, Commands, OutputFormat, TemplateArgs, TemplateSubcommand,
    parse_position,
};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn check_flags_parsing()
{
    // Given
    let argv = vec![
        "argnote",
        "--quiet",
        "check",
        "src/main/java",
        "Extra.java",
        "--format",
        "jsonl",
        "--fail-on-findings",
    ];

    // When
    let cli = Cli::parse_from(argv);

    // Then
    assert!(cli.context().quiet);
    match cli.command
    {
        Commands::Check(CheckArgs { paths, format, fail_on_findings }) =>
        {
            assert_eq!(paths, vec![PathBuf::from("src/main/java"), PathBuf::from("Extra.java")]);
            assert_eq!(format, OutputFormat::Jsonl);
            assert!(fail_on_findings);
        }
        _ => panic!("expected Check command"),
    }
}

#[test]
fn check_defaults_to_current_directory()
{
    let cli = Cli::parse_from(["argnote", "check"]);
    match cli.command
    {
        Commands::Check(args) =>
        {
            assert_eq!(args.paths, vec![PathBuf::from(".")]);
            assert_eq!(args.format, OutputFormat::Text);
            assert!(!args.fail_on_findings);
        }
        _ => panic!("expected Check command"),
    }
}

#[test]
fn annotate_position_and_root()
{
    let cli = Cli::parse_from([
        "argnote",
        "annotate",
        "src/Main.java:12:30",
        "--root",
        "src",
        "--apply",
    ]);
    match cli.command
    {
        Commands::Annotate(AnnotateArgs { position, root, apply }) =>
        {
            assert_eq!(position, "src/Main.java:12:30");
            assert_eq!(root, PathBuf::from("src"));
            assert!(apply);
        }
        _ => panic!("expected Annotate command"),
    }
}

#[test]
fn template_set_keeps_text_verbatim()
{
    // Settings path is a global flag and may follow the subcommand
    let cli = Cli::parse_from(["argnote", "template", "set", "/*%s:*/", "--settings", "s.toml"]);
    assert_eq!(cli.context().settings, Some(PathBuf::from("s.toml")));
    match cli.command
    {
        Commands::Template(TemplateArgs { command: TemplateSubcommand::Set { text } }) =>
        {
            assert_eq!(text, "/*%s:*/");
        }
        _ => panic!("expected Template Set command"),
    }
}

#[test]
fn position_splits_from_the_right()
{
    assert_eq!(
        parse_position("C:/work/Main.java:3:7"),
        Some((PathBuf::from("C:/work/Main.java"), 3, 7))
    );
    assert_eq!(parse_position("Main.java:3"), None);
    assert_eq!(parse_position(":3:7"), None);
    assert_eq!(parse_position("Main.java:x:7"), None);
}
