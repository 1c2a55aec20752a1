//! Option parsing. Options precede actions: the leading run of tokens that
//! start with `-` is consumed here, the rest is left for the dispatcher.

use crate::capabilities::Capabilities;
use crate::config::{BootConfiguration, SchedulerPolicy};
use crate::error::OptionError;
use core::num::ParseIntError;

/// What an option does to the configuration.
#[derive(Clone, Copy)]
pub enum OptionKind {
    /// Print usage and power off.
    Help,
    /// A flag; a value given with `=` is ignored.
    Switch(fn(&mut BootConfiguration)),
    /// Requires `NAME=VALUE`.
    Value {
        placeholder: &'static str,
        set: fn(&mut BootConfiguration, &str) -> Result<(), ParseIntError>,
    },
}

/// A recognized option.
#[derive(Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    /// Without these the option does not exist.
    pub requires: Capabilities,
    pub kind: OptionKind,
    pub help: &'static str,
}

impl OptionSpec {
    /// Whether a build with `capabilities` knows this option.
    #[must_use]
    pub const fn is_available(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(self.requires)
    }
}

/// Every option the kernel knows, in usage order.
pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "-h",
        requires: Capabilities::NONE,
        kind: OptionKind::Help,
        help: "Print this help message and power off.",
    },
    OptionSpec {
        name: "-q",
        requires: Capabilities::NONE,
        kind: OptionKind::Switch(|c| c.power_off_when_done = true),
        help: "Power off VM after actions or on panic.",
    },
    OptionSpec {
        name: "-f",
        requires: Capabilities::FILESYSTEM,
        kind: OptionKind::Switch(|c| c.format_filesystem = true),
        help: "Format file system disk during startup.",
    },
    OptionSpec {
        name: "-rs",
        requires: Capabilities::NONE,
        kind: OptionKind::Value {
            placeholder: "SEED",
            set: |c, v| {
                c.random_seed = Some(v.parse()?);
                Ok(())
            },
        },
        help: "Set random number seed to SEED.",
    },
    OptionSpec {
        name: "-mlfqs",
        requires: Capabilities::NONE,
        kind: OptionKind::Switch(|c| c.scheduler_policy = SchedulerPolicy::Mlfqs),
        help: "Use multi-level feedback queue scheduler.",
    },
    OptionSpec {
        name: "-ul",
        requires: Capabilities::USER_PROGRAMS,
        kind: OptionKind::Value {
            placeholder: "COUNT",
            set: |c, v| {
                c.user_page_limit = Some(v.parse()?);
                Ok(())
            },
        },
        help: "Limit user memory to COUNT pages.",
    },
    OptionSpec {
        name: "-threads-tests",
        requires: Capabilities::USER_PROGRAMS,
        kind: OptionKind::Switch(|c| c.test_mode = true),
        help: "Run TEST from the built-in kernel tests.",
    },
];

/// Outcome of [`parse_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedOptions<'a, 'b> {
    /// Options applied; these tokens are the actions.
    Actions(&'b [&'a str]),
    /// `-h` was given. Nothing after it was looked at.
    Help,
}

/// Apply the leading options of `argv` to `config`.
///
/// # Errors
/// The first option that is unknown to this build, lacks its value, or has
/// a value that is not a decimal number.
pub fn parse_options<'a, 'b>(
    argv: &'b [&'a str],
    capabilities: Capabilities,
    config: &mut BootConfiguration,
) -> Result<ParsedOptions<'a, 'b>, OptionError<'a>> {
    let mut rest = argv;
    while let Some((&token, tail)) = rest.split_first() {
        if !token.starts_with('-') {
            break;
        }

        let (name, value) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };

        let spec = OPTIONS
            .iter()
            .find(|o| o.name == name && o.is_available(capabilities))
            .ok_or(OptionError::UnknownOption { name })?;

        match spec.kind {
            OptionKind::Help => return Ok(ParsedOptions::Help),
            OptionKind::Switch(apply) => apply(config),
            OptionKind::Value { set, .. } => {
                let value = value
                    .filter(|v| !v.is_empty())
                    .ok_or(OptionError::MissingValue { name })?;
                set(config, value).map_err(|source| OptionError::InvalidValue {
                    name,
                    value,
                    source,
                })?;
            }
        }

        rest = tail;
    }

    Ok(ParsedOptions::Actions(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: Capabilities = Capabilities::USER_PROGRAMS.union(Capabilities::FILESYSTEM);

    #[test]
    fn applies_options_and_returns_the_actions() {
        let argv = ["-q", "-rs=42", "-mlfqs", "-f", "-ul=128", "run", "alarm-single"];
        let mut config = BootConfiguration::default();

        let parsed = parse_options(&argv, ALL, &mut config).unwrap();
        assert_eq!(parsed, ParsedOptions::Actions(&["run", "alarm-single"]));
        assert_eq!(
            config,
            BootConfiguration {
                power_off_when_done: true,
                format_filesystem: true,
                random_seed: Some(42),
                scheduler_policy: SchedulerPolicy::Mlfqs,
                user_page_limit: Some(128),
                test_mode: false,
            }
        );
    }

    #[test]
    fn unknown_option_is_named_verbatim() {
        let mut config = BootConfiguration::default();
        assert_eq!(
            parse_options(&["-q", "-zz", "run"], ALL, &mut config),
            Err(OptionError::UnknownOption { name: "-zz" })
        );
    }

    #[test]
    fn reparsing_the_remainder_consumes_nothing() {
        let argv = ["-q", "-rs=7", "ls", "-q"];
        let mut config = BootConfiguration::default();
        let ParsedOptions::Actions(rest) = parse_options(&argv, ALL, &mut config).unwrap() else {
            panic!("expected actions");
        };

        let before = config;
        assert_eq!(
            parse_options(rest, ALL, &mut config),
            Ok(ParsedOptions::Actions(rest))
        );
        assert_eq!(config, before);
    }

    #[test]
    fn options_of_missing_subsystems_are_unknown() {
        let mut config = BootConfiguration::default();
        assert_eq!(
            parse_options(&["-f"], Capabilities::NONE, &mut config),
            Err(OptionError::UnknownOption { name: "-f" })
        );
        assert_eq!(
            parse_options(&["-ul=4"], Capabilities::FILESYSTEM, &mut config),
            Err(OptionError::UnknownOption { name: "-ul" })
        );
        assert_eq!(
            parse_options(&["-threads-tests"], Capabilities::USER_PROGRAMS, &mut config),
            Ok(ParsedOptions::Actions(&[]))
        );
        assert!(config.test_mode);
    }

    #[test]
    fn help_stops_parsing() {
        let mut config = BootConfiguration::default();
        assert_eq!(
            parse_options(&["-h", "-zz"], ALL, &mut config),
            Ok(ParsedOptions::Help)
        );
    }

    #[test]
    fn value_options_need_a_decimal_value() {
        let mut config = BootConfiguration::default();
        assert_eq!(
            parse_options(&["-rs"], ALL, &mut config),
            Err(OptionError::MissingValue { name: "-rs" })
        );
        assert_eq!(
            parse_options(&["-rs="], ALL, &mut config),
            Err(OptionError::MissingValue { name: "-rs" })
        );

        let err = parse_options(&["-ul=lots"], ALL, &mut config).unwrap_err();
        assert!(matches!(
            err,
            OptionError::InvalidValue { name: "-ul", value: "lots", .. }
        ));
        assert_eq!(config, BootConfiguration::default());
    }

    #[test]
    fn switches_ignore_values() {
        let mut config = BootConfiguration::default();
        parse_options(&["-q=0"], ALL, &mut config).unwrap();
        assert!(config.power_off_when_done);
    }
}
