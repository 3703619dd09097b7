//! Annotation comment template.
//!
//! The template is the only state shared across calls. It is read whenever a
//! fix is applied and written only through [`TemplateSettings::set_comment_template`],
//! which validates before storing.

use std::fmt;

use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    cli::{AppContext, TemplateArgs, TemplateSubcommand},
    core::{engine::Workspace, fix::CommentFixApplier},
    infra::settings::SettingsStore,
};

/// Placeholder substituted with the parameter name.
pub const PLACEHOLDER: &str = "%s";

/// Built-in template.
pub const DEFAULT_COMMENT_FORMAT: &str = "/* %s= */";

/// Settings key holding the template.
pub const COMMENT_FORMAT_KEY: &str = "DEFAULT_COMMENT_FORMAT";

/// Value substituted during validation.
const PROBE: &str = "test_param";

/// A validated template: one `%s`, renders to a `/* ... */` block comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTemplate(String);

impl CommentTemplate {
    /// Trimmed `text` if it is a valid template.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.matches(PLACEHOLDER).count() != 1 {
            return None;
        }
        let probe = trimmed.replacen(PLACEHOLDER, PROBE, 1);
        (probe.starts_with("/*") && probe.ends_with("*/")).then(|| Self(trimmed.to_string()))
    }

    /// Comment text for `parameter`.
    pub fn render(&self, parameter: &str) -> String {
        self.0.replacen(PLACEHOLDER, parameter, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CommentTemplate {
    fn default() -> Self {
        Self(DEFAULT_COMMENT_FORMAT.to_string())
    }
}

impl fmt::Display for CommentTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration read/write capability over a settings store.
pub trait TemplateSettings {
    fn settings_store(&self) -> &dyn SettingsStore;

    /// Stored template, or the default when unset or no longer valid.
    fn comment_template(&self) -> CommentTemplate {
        let raw = self.settings_store().get(COMMENT_FORMAT_KEY, DEFAULT_COMMENT_FORMAT);
        CommentTemplate::parse(&raw).unwrap_or_else(|| {
            warn!(stored = %raw, "stored comment template is invalid; using default");
            CommentTemplate::default()
        })
    }

    /// Store `text` if valid. Returns whether it was accepted; a rejected value
    /// leaves the previous template in place.
    fn set_comment_template(&self, text: &str) -> bool {
        let Some(template) = CommentTemplate::parse(text) else {
            debug!(rejected = text, "comment template rejected");
            return false;
        };
        match self.settings_store().set(COMMENT_FORMAT_KEY, template.as_str()) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to persist comment template");
                false
            }
        }
    }
}

/// Comparison form of a comment: delimiters, whitespace, and `=` removed,
/// lowercased.
pub fn normalize_comment(text: &str) -> String {
    let body = text.trim();
    let body = body.strip_prefix("/*").unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);
    let body = body.strip_prefix("//").unwrap_or(body);
    body.chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .flat_map(char::to_lowercase)
        .collect()
}

/// `template get` / `template set TEXT`.
pub fn run(args: TemplateArgs, ctx: &AppContext) -> Result<()> {
    let ws = Workspace::load(ctx)?;
    let settings = ws.settings(ctx)?;
    let accessor = CommentFixApplier::new(&settings);

    match args.command {
        TemplateSubcommand::Get => println!("{}", accessor.comment_template()),
        TemplateSubcommand::Set { text } => {
            if !accessor.set_comment_template(&text) {
                anyhow::bail!(
                    "Template rejected: it needs exactly one {PLACEHOLDER} and must render to /* ... */ \
                     (keeping {})",
                    accessor.comment_template()
                );
            }
            if !ctx.quiet {
                println!("Comment template set to {}", accessor.comment_template());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::settings::MemorySettings;
    use proptest::prelude::*;

    struct Holder(MemorySettings);

    impl TemplateSettings for Holder {
        fn settings_store(&self) -> &dyn SettingsStore {
            &self.0
        }
    }

    #[test]
    fn default_renders_parameter_name() {
        let holder = Holder(MemorySettings::new());
        assert_eq!(holder.comment_template().render("a"), "/* a= */");
    }

    #[test]
    fn bad_template_is_rejected_and_previous_kept() {
        let holder = Holder(MemorySettings::new());
        assert!(holder.set_comment_template("/* :%s */"));
        assert!(!holder.set_comment_template("bad"));
        assert_eq!(holder.comment_template().as_str(), "/* :%s */");
        assert!(holder.set_comment_template("/* %s= */"));
        assert_eq!(holder.comment_template().as_str(), DEFAULT_COMMENT_FORMAT);
    }

    #[test]
    fn input_is_trimmed_before_storing() {
        let holder = Holder(MemorySettings::new());
        assert!(holder.set_comment_template("   /*%s:*/ \n"));
        assert_eq!(holder.comment_template().render("x"), "/*x:*/");
    }

    #[test]
    fn placeholder_count_must_be_one() {
        assert!(CommentTemplate::parse("/* name */").is_none());
        assert!(CommentTemplate::parse("/* %s %s */").is_none());
        assert!(CommentTemplate::parse("// %s=").is_none());
    }

    #[test]
    fn invalid_stored_value_falls_back_to_default() {
        let store = MemorySettings::new();
        store.set(COMMENT_FORMAT_KEY, "oops").unwrap();
        assert_eq!(Holder(store).comment_template(), CommentTemplate::default());
    }

    #[test]
    fn normalization_ignores_style_differences() {
        assert_eq!(normalize_comment("/* a= */"), "a");
        assert_eq!(normalize_comment("/*A =*/"), "a");
        assert_eq!(normalize_comment("// a="), "a");
        assert_ne!(normalize_comment("/* a_b= */"), normalize_comment("/* ab= */"));
    }

    proptest! {
        #[test]
        fn accepted_templates_render_block_comments(name in "[a-zA-Z_][a-zA-Z0-9_]{0,12}",
                                                     pre in "[ a-z:=]{0,4}",
                                                     post in "[ a-z:=]{0,4}") {
            let text = format!("/*{pre}%s{post}*/");
            let template = CommentTemplate::parse(&text).expect("well-formed template");
            let rendered = template.render(&name);
            prop_assert!(rendered.starts_with("/*"));
            prop_assert!(rendered.ends_with("*/"));
            prop_assert!(rendered.contains(name.as_str()));
        }

        #[test]
        fn unwrapped_text_is_never_accepted(text in "[^/*]{0,20}") {
            prop_assert!(CommentTemplate::parse(&text).is_none());
        }

        #[test]
        fn rendered_default_normalizes_to_lowercase_name(name in "[a-zA-Z][a-zA-Z0-9]{0,12}") {
            let rendered = CommentTemplate::default().render(&name);
            prop_assert_eq!(normalize_comment(&rendered), name.to_lowercase());
        }
    }
}
