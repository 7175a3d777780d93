//! Option schemas for command nodes.
//!
//! Every node owns an [`OptionSchema`]: a `clap::Command` assembled at build
//! time from the node's option builders. Parsing is tolerant: option-looking
//! tokens the schema does not declare are set aside instead of failing the
//! parse, and every remaining positional token is collected as an argument.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};

/// Id of the automatically generated help flag (`--help`, `-?`).
pub const HELP_ID: &str = "help";

/// Id of the catch-all positional that collects leftover arguments.
const ARGUMENTS_ID: &str = "arguments";

/// A mutator applied to a node's schema at build time.
///
/// Builders run in registration order and may add any flags or options.
pub type OptionBuilder =
    Box<dyn FnOnce(clap::Command) -> anyhow::Result<clap::Command> + Send + Sync>;

/// The immutable option schema of a command node.
#[derive(Debug, Clone)]
pub struct OptionSchema {
    command: clap::Command,
    help: bool,
    ids: Vec<String>,
}

impl OptionSchema {
    /// Create a schema for the named command, optionally accepting `--help`/`-?`.
    pub fn new(name: &str, auto_help: bool) -> Self {
        let mut command = clap::Command::new(name.to_owned())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true);

        if auto_help {
            command = command.arg(
                Arg::new(HELP_ID)
                    .long("help")
                    .short('?')
                    .action(ArgAction::SetTrue)
                    .help("Help text for options"),
            );
        }

        Self {
            command,
            help: auto_help,
            ids: Vec::new(),
        }
    }

    /// Run one option builder against the schema.
    pub(crate) fn apply(mut self, builder: OptionBuilder) -> anyhow::Result<Self> {
        self.command = builder(self.command)?;
        Ok(self)
    }

    /// Add the hidden positional that collects leftover arguments.
    pub(crate) fn with_arguments(mut self) -> Self {
        self.command = self.command.arg(
            Arg::new(ARGUMENTS_ID)
                .value_name("ARGS")
                .action(ArgAction::Append)
                .num_args(1..)
                .allow_negative_numbers(true)
                .hide(true),
        );
        self.ids = self
            .command
            .get_arguments()
            .map(|arg| arg.get_id().as_str().to_owned())
            .collect();
        self
    }

    /// Finish the schema: add the argument catch-all and validate it.
    ///
    /// Returns the parser's complaint if the schema is malformed.
    pub(crate) fn seal(self) -> Result<Self, String> {
        let schema = self.with_arguments();
        let mut probe = schema.command.clone();
        panic::catch_unwind(AssertUnwindSafe(move || probe.build()))
            .map_err(|payload| super::panic_message(payload.as_ref()))?;
        Ok(schema)
    }

    /// Whether the schema carries the help flag.
    #[inline]
    pub fn has_help_flag(&self) -> bool {
        self.help
    }

    /// Check whether an option id is declared by this schema.
    pub fn declares(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    /// Render the usage/help block for this schema.
    pub fn help_text(&self) -> String {
        self.command.clone().render_help().to_string()
    }

    /// Parse a token vector into option values.
    ///
    /// Unrecognized option tokens are collected rather than rejected. Errors
    /// come only from declared options, e.g. a value-taking option with no
    /// value.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ParsedOptions, clap::Error> {
        let mut accepted = Vec::with_capacity(tokens.len());
        let mut unrecognized = Vec::new();
        let mut literal = false;

        for token in tokens.iter().map(AsRef::as_ref) {
            if literal || self.recognizes(token) {
                accepted.push(token.to_owned());
            } else {
                unrecognized.push(token.to_owned());
            }
            if token == "--" {
                literal = true;
            }
        }

        let matches = self.command.clone().try_get_matches_from(accepted)?;
        let arguments = matches
            .try_get_many::<String>(ARGUMENTS_ID)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let help = self.help
            && matches!(matches.value_source(HELP_ID), Some(ValueSource::CommandLine));

        Ok(ParsedOptions {
            matches,
            arguments,
            unrecognized,
            help,
            ids: self.ids.clone(),
        })
    }

    /// Whether a token is either a plain value or an option this schema declares.
    fn recognizes(&self, token: &str) -> bool {
        if token == "--" {
            return true;
        }

        if let Some(long) = token.strip_prefix("--") {
            let name = long.split_once('=').map_or(long, |(name, _)| name);
            return self.command.get_arguments().any(|arg| {
                arg.get_long() == Some(name)
                    || arg
                        .get_all_aliases()
                        .is_some_and(|aliases| aliases.contains(&name))
            });
        }

        let Some(shorts) = token.strip_prefix('-') else {
            return true;
        };
        if shorts.is_empty() || token.parse::<f64>().is_ok() {
            return true;
        }

        // A cluster like `-ab` is recognized only if every flag is known; a
        // value-taking flag swallows the rest of the token.
        for c in shorts.chars() {
            let arg = self.command.get_arguments().find(|arg| {
                arg.get_short() == Some(c)
                    || arg
                        .get_all_short_aliases()
                        .is_some_and(|aliases| aliases.contains(&c))
            });
            match arg {
                Some(arg) if arg.get_action().takes_values() => return true,
                Some(_) => {}
                None => return false,
            }
        }
        true
    }
}

/// Option values produced by [`OptionSchema::parse`].
#[derive(Debug, Clone)]
pub struct ParsedOptions {
    matches: ArgMatches,
    arguments: Vec<String>,
    unrecognized: Vec<String>,
    help: bool,
    ids: Vec<String>,
}

impl ParsedOptions {
    /// Whether `--help` or `-?` was passed.
    #[inline]
    pub fn help_requested(&self) -> bool {
        self.help
    }

    /// Whether the option was given on the command line.
    pub fn has(&self, id: &str) -> bool {
        self.declares(id)
            && matches!(self.matches.value_source(id), Some(ValueSource::CommandLine))
    }

    /// The string value of an option, if present (or defaulted).
    pub fn value(&self, id: &str) -> Option<&str> {
        self.get::<String>(id).map(String::as_str)
    }

    /// Every string value of a multi-valued option.
    pub fn values(&self, id: &str) -> Vec<&str> {
        if !self.declares(id) {
            return Vec::new();
        }
        self.matches
            .try_get_many::<String>(id)
            .ok()
            .flatten()
            .map(|values| values.map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// A typed option value, using whatever value parser the option declared.
    pub fn get<T: Any + Clone + Send + Sync + 'static>(&self, id: &str) -> Option<&T> {
        if !self.declares(id) {
            return None;
        }
        self.matches.try_get_one::<T>(id).ok().flatten()
    }

    /// Positional arguments, in order.
    #[inline]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Option-looking tokens the schema did not declare.
    #[inline]
    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    /// Raw access to the underlying matches.
    #[inline]
    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }

    fn declares(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(auto_help: bool) -> OptionSchema {
        OptionSchema::new("test", auto_help)
            .apply(Box::new(|cmd: clap::Command| {
                Ok(cmd
                    .arg(Arg::new("verbose").long("verbose").short('v').action(ArgAction::SetTrue))
                    .arg(Arg::new("count").long("count").short('n')))
            }))
            .unwrap()
            .seal()
            .unwrap()
    }

    #[test]
    fn test_help_flag() {
        let schema = schema(true);
        assert!(schema.parse(&["--help"]).unwrap().help_requested());
        assert!(schema.parse(&["-?"]).unwrap().help_requested());
        assert!(!schema.parse(&["foo"]).unwrap().help_requested());
    }

    #[test]
    fn test_no_auto_help() {
        let schema = schema(false);
        assert!(!schema.has_help_flag());
        let parsed = schema.parse(&["--help"]).unwrap();
        assert!(!parsed.help_requested());
        assert_eq!(parsed.unrecognized(), ["--help"]);
    }

    #[test]
    fn test_flags_values_and_arguments() {
        let parsed = schema(true)
            .parse(&["-v", "first", "--count", "3", "second"])
            .unwrap();
        assert!(parsed.has("verbose"));
        assert_eq!(parsed.value("count"), Some("3"));
        assert_eq!(parsed.arguments(), ["first", "second"]);
        assert!(!parsed.has("help"));
    }

    #[test]
    fn test_unrecognized_tolerated() {
        let parsed = schema(true)
            .parse(&["--bogus", "-x", "value"])
            .unwrap();
        assert_eq!(parsed.unrecognized(), ["--bogus", "-x"]);
        assert_eq!(parsed.arguments(), ["value"]);
    }

    #[test]
    fn test_negative_numbers_are_arguments() {
        let parsed = schema(true).parse(&["-5", "2.5"]).unwrap();
        assert_eq!(parsed.arguments(), ["-5", "2.5"]);
        assert!(parsed.unrecognized().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_absent() {
        let parsed = schema(true).parse(&["x"]).unwrap();
        assert!(!parsed.has("nope"));
        assert_eq!(parsed.value("nope"), None);
        assert!(parsed.values("nope").is_empty());
    }

    #[test]
    fn test_missing_value_is_error() {
        assert!(schema(true).parse(&["--count"]).is_err());
    }

    #[test]
    fn test_help_text_mentions_options() {
        let text = schema(true).help_text();
        assert!(text.contains("--help"));
        assert!(text.contains("--verbose"));
    }

    #[test]
    fn test_failing_builder() {
        let result = OptionSchema::new("test", true)
            .apply(Box::new(|_: clap::Command| -> anyhow::Result<clap::Command> {
                Err(anyhow::anyhow!("nope"))
            }));
        assert!(result.is_err());
    }
}
