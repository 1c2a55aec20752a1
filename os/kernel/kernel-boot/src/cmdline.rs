//! # Kernel Command Line
//!
//! The loader stores the command line as a token count plus a fixed-size
//! blob of NUL-terminated tokens (see [`kernel_info::boot`]). Tokens are
//! borrowed straight out of that blob.

use crate::error::CommandLineError;
use core::fmt;
use kernel_info::boot::LOADER_ARGS_LEN;

/// Most tokens the blob can carry: every token needs at least one
/// character plus its terminator.
pub const MAX_ARGS: usize = LOADER_ARGS_LEN / 2;

/// The tokenized command line.
///
/// Indexing one past the last token yields `None`, the sentinel.
#[derive(Clone, Copy)]
pub struct Argv<'a> {
    tokens: [&'a str; MAX_ARGS],
    len: usize,
}

impl<'a> Argv<'a> {
    #[must_use]
    pub fn as_slice(&self) -> &[&'a str] {
        &self.tokens[..self.len]
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Token `index`, or `None` at and past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.as_slice().get(index).copied()
    }
}

impl fmt::Debug for Argv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Echo form: each token preceded by a space, quoted if it contains one.
impl fmt::Display for Argv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in self.as_slice() {
            if token.contains(' ') {
                write!(f, " '{token}'")?;
            } else {
                write!(f, " {token}")?;
            }
        }
        Ok(())
    }
}

/// Split `blob` into `argc` NUL-terminated tokens.
///
/// A token missing its terminator runs to the end of the blob. The parsed
/// line is echoed to the log.
///
/// # Errors
/// - [`CommandLineError::TooManyArguments`] if `argc` exceeds [`MAX_ARGS`].
/// - [`CommandLineError::Overflow`] if the blob runs out before `argc`
///   tokens were found.
/// - [`CommandLineError::InvalidToken`] for a token that is not UTF-8.
pub fn read_command_line(argc: u32, blob: &[u8]) -> Result<Argv<'_>, CommandLineError> {
    let declared = argc;
    let argc = usize::try_from(argc)
        .ok()
        .filter(|&n| n <= MAX_ARGS)
        .ok_or(CommandLineError::TooManyArguments {
            declared,
            max: MAX_ARGS,
        })?;

    let mut argv = Argv {
        tokens: [""; MAX_ARGS],
        len: 0,
    };

    let mut rest = blob;
    for index in 0..argc {
        if rest.is_empty() {
            return Err(CommandLineError::Overflow {
                declared,
                parsed: index,
            });
        }
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        let token = core::str::from_utf8(&rest[..len])
            .map_err(|_| CommandLineError::InvalidToken { index })?;
        argv.tokens[index] = token;
        argv.len += 1;
        rest = rest.get(len + 1..).unwrap_or_default();
    }

    log::info!("Kernel command line:{argv}");
    Ok(argv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Lay tokens out the way the loader does.
    fn encode(tokens: &[&str]) -> (u32, [u8; LOADER_ARGS_LEN]) {
        let mut blob = [0u8; LOADER_ARGS_LEN];
        let mut at = 0;
        for t in tokens {
            blob[at..at + t.len()].copy_from_slice(t.as_bytes());
            at += t.len() + 1;
        }
        (u32::try_from(tokens.len()).unwrap(), blob)
    }

    #[test]
    fn reads_tokens_and_stops_at_the_sentinel() {
        let (argc, blob) = encode(&["-q", "run", "alarm-single"]);
        let argv = read_command_line(argc, &blob).unwrap();
        assert_eq!(argv.as_slice(), ["-q", "run", "alarm-single"]);
        assert_eq!(argv.get(2), Some("alarm-single"));
        assert_eq!(argv.get(3), None);
    }

    #[test]
    fn echo_quotes_tokens_with_spaces() {
        let (argc, blob) = encode(&["-q", "run", "echo hi"]);
        let argv = read_command_line(argc, &blob).unwrap();
        assert_eq!(argv.to_string(), " -q run 'echo hi'");
    }

    #[test]
    fn declared_count_beyond_the_blob_overflows() {
        let blob = *b"run\0ls\0";
        assert_eq!(
            read_command_line(3, &blob).unwrap_err(),
            CommandLineError::Overflow { declared: 3, parsed: 2 }
        );
    }

    #[test]
    fn unterminated_last_token_runs_to_the_end() {
        let blob = *b"run\0alarm";
        let argv = read_command_line(2, &blob).unwrap();
        assert_eq!(argv.as_slice(), ["run", "alarm"]);
        assert!(read_command_line(3, &blob).is_err());
    }

    #[test]
    fn empty_command_line() {
        let argv = read_command_line(0, &[]).unwrap();
        assert!(argv.is_empty());
        assert_eq!(argv.get(0), None);
        assert_eq!(argv.to_string(), "");
    }

    #[test]
    fn count_beyond_capacity_is_rejected_up_front() {
        let blob = [0u8; LOADER_ARGS_LEN];
        assert_eq!(
            read_command_line(65, &blob).unwrap_err(),
            CommandLineError::TooManyArguments { declared: 65, max: 64 }
        );
        // 64 empty tokens fit.
        assert_eq!(read_command_line(64, &blob).unwrap().len(), 64);
    }

    #[test]
    fn invalid_utf8_names_the_token() {
        let blob = *b"ok\0\xff\xfe\0";
        assert_eq!(
            read_command_line(2, &blob).unwrap_err(),
            CommandLineError::InvalidToken { index: 1 }
        );
    }

    proptest! {
        #[test]
        fn encoded_tokens_read_back_unchanged(
            tokens in proptest::collection::vec("[a-z0-9 =-]{1,6}", 0..16)
        ) {
            let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
            let (argc, blob) = encode(&tokens);
            let argv = read_command_line(argc, &blob).unwrap();
            prop_assert_eq!(argv.len(), tokens.len());
            prop_assert_eq!(argv.as_slice(), tokens.as_slice());
            prop_assert_eq!(argv.get(tokens.len()), None);
        }
    }
}
