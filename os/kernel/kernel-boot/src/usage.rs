//! The `-h` help text, generated from the option and action tables.

use crate::actions::ActionTableEntry;
use crate::capabilities::Capabilities;
use crate::options::{OPTIONS, OptionKind};
use core::fmt::{self, Write};

const SYNOPSIS_WIDTH: usize = 18;

/// Write the command line help for a build with `capabilities`.
///
/// Only options and actions the build knows about are listed.
///
/// # Errors
/// Whatever `w` reports.
pub fn write_usage<C>(
    w: &mut impl Write,
    capabilities: Capabilities,
    actions: &[ActionTableEntry<C>],
) -> fmt::Result {
    w.write_str(
        "\nCommand line syntax: [OPTION...] [ACTION...]\n\
         Options must precede actions.\n\
         Actions are executed in the order specified.\n\
         \nAvailable actions:\n",
    )?;

    for action in actions.iter().filter(|a| a.is_available(capabilities)) {
        if let Some(heading) = action.heading {
            writeln!(w, "{heading}")?;
        }
        writeln!(w, "  {:<SYNOPSIS_WIDTH$} {}", action.synopsis, action.help)?;
    }

    w.write_str("\nOptions:\n")?;
    for option in OPTIONS.iter().filter(|o| o.is_available(capabilities)) {
        if let OptionKind::Value { placeholder, .. } = option.kind {
            // Pad the joined form, not the name alone.
            let mut synopsis = Synopsis::default();
            write!(synopsis, "{}={placeholder}", option.name)?;
            writeln!(w, "  {:<SYNOPSIS_WIDTH$} {}", synopsis.as_str(), option.help)?;
        } else {
            writeln!(w, "  {:<SYNOPSIS_WIDTH$} {}", option.name, option.help)?;
        }
    }
    Ok(())
}

/// Fixed buffer for an option's `NAME=VALUE` form.
#[derive(Default)]
struct Synopsis {
    buf: [u8; SYNOPSIS_WIDTH],
    len: usize,
}

impl Synopsis {
    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }
}

impl Write for Synopsis {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        self.buf
            .get_mut(self.len..end)
            .ok_or(fmt::Error)?
            .copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{BootContext, builtin_actions};
    use crate::config::BootConfiguration;

    struct NoKernel(BootConfiguration);

    impl BootContext for NoKernel {
        fn config(&self) -> &BootConfiguration {
            &self.0
        }

        fn config_mut(&mut self) -> &mut BootConfiguration {
            &mut self.0
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::NONE
        }

        fn run_test(&mut self, _name: &str) -> Result<(), &'static str> {
            Ok(())
        }
    }

    fn usage(capabilities: Capabilities) -> String {
        let mut text = String::new();
        write_usage(&mut text, capabilities, &builtin_actions::<NoKernel>(capabilities)).unwrap();
        text
    }

    #[test]
    fn minimal_build() {
        assert_eq!(
            usage(Capabilities::NONE),
            "\nCommand line syntax: [OPTION...] [ACTION...]\n\
             Options must precede actions.\n\
             Actions are executed in the order specified.\n\
             \nAvailable actions:\n\
             \x20 run TEST           Run TEST.\n\
             \nOptions:\n\
             \x20 -h                 Print this help message and power off.\n\
             \x20 -q                 Power off VM after actions or on panic.\n\
             \x20 -rs=SEED           Set random number seed to SEED.\n\
             \x20 -mlfqs             Use multi-level feedback queue scheduler.\n"
        );
    }

    #[test]
    fn full_build_lists_filesystem_and_user_program_entries() {
        let text = usage(Capabilities::FILESYSTEM.union(Capabilities::USER_PROGRAMS));
        assert!(text.contains("  run 'PROG [ARG...]' Run PROG and wait for it to complete.\n"));
        assert!(text.contains("  cat FILE           Print FILE to the console.\n"));
        assert!(text.contains(
            "  rm FILE            Delete FILE.\n\
             Use these actions indirectly via the host runner's -g and -p options:\n\
             \x20 put FILE           Put FILE into file system from scratch disk.\n"
        ));
        assert!(text.contains("  -f                 Format file system disk during startup.\n"));
        assert!(text.contains("  -ul=COUNT          Limit user memory to COUNT pages.\n"));
    }
}
