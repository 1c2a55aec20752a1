//! Error kinds of the boot path. Every one of them is fatal.

use crate::bootstrap::Stage;
use core::num::ParseIntError;
use kernel_vmem::{AddressSpaceError, FrameOutOfBounds};

/// The loader's command line could not be read.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandLineError {
    /// The blob ended before the declared number of tokens was found.
    #[error("command line arguments overflow ({parsed} of {declared} tokens found)")]
    Overflow { declared: u32, parsed: usize },
    #[error("command line declares {declared} tokens, at most {max} fit")]
    TooManyArguments { declared: u32, max: usize },
    #[error("command line token {index} is not valid UTF-8")]
    InvalidToken { index: usize },
}

/// A leading `-` token could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError<'a> {
    #[error("unknown option `{name}' (use -h for help)")]
    UnknownOption { name: &'a str },
    #[error("option `{name}' requires a value")]
    MissingValue { name: &'a str },
    #[error("option `{name}' has invalid value `{value}'")]
    InvalidValue {
        name: &'a str,
        value: &'a str,
        #[source]
        source: ParseIntError,
    },
}

/// An action could not be dispatched or failed while running.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError<'a> {
    #[error("unknown action `{name}' (use -h for help)")]
    UnknownAction { name: &'a str },
    #[error("action `{action}' requires {required} argument(s)")]
    MissingArgument { action: &'a str, required: usize },
    #[error("action `{action}' failed: {reason}")]
    ActionFailed { action: &'a str, reason: &'static str },
}

/// The boot table violates the stage order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("boot stage {stage} listed after {after}")]
    OutOfOrder { stage: Stage, after: Stage },
    #[error("mandatory boot stage {stage} is missing")]
    MissingStage { stage: Stage },
}

/// Why a single boot step gave up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// No page could be had for kernel memory management structures.
    #[error("allocation failure: {0}")]
    AllocationFailure(AddressSpaceError),
    /// The page tables already hold something the new mapping conflicts with.
    #[error("mapping conflict: {0}")]
    Mapping(AddressSpaceError),
    #[error(transparent)]
    FrameOutOfBounds(FrameOutOfBounds),
    #[error("{0}")]
    Failed(&'static str),
}

impl From<AddressSpaceError> for StepError {
    fn from(value: AddressSpaceError) -> Self {
        match value {
            AddressSpaceError::FrameOutOfBounds(e) => Self::FrameOutOfBounds(e),
            e @ AddressSpaceError::LargePageInTheWay { .. } => Self::Mapping(e),
            e @ AddressSpaceError::OutOfMemory { .. } => Self::AllocationFailure(e),
        }
    }
}

impl From<FrameOutOfBounds> for StepError {
    fn from(value: FrameOutOfBounds) -> Self {
        Self::FrameOutOfBounds(value)
    }
}

/// A boot step failed; boot stops here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{step} failed: {source}")]
pub struct StepFailed {
    pub stage: Stage,
    pub step: &'static str,
    #[source]
    pub source: StepError,
}

/// Anything that ends the boot path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootError<'a> {
    #[error(transparent)]
    CommandLine(#[from] CommandLineError),
    #[error("{0}")]
    Option(OptionError<'a>),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Step(#[from] StepFailed),
    #[error("{0}")]
    Action(ActionError<'a>),
}

// Borrowed errors cannot be a `source()`, so these are spelled out.
impl<'a> From<OptionError<'a>> for BootError<'a> {
    fn from(value: OptionError<'a>) -> Self {
        Self::Option(value)
    }
}

impl<'a> From<ActionError<'a>> for BootError<'a> {
    fn from(value: ActionError<'a>) -> Self {
        Self::Action(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_addresses::PhysicalPage;
    use kernel_vmem::Level;

    #[test]
    fn messages_name_the_offending_token() {
        let e = OptionError::UnknownOption { name: "-zz" };
        assert_eq!(e.to_string(), "unknown option `-zz' (use -h for help)");

        let e = ActionError::MissingArgument { action: "cat", required: 1 };
        assert_eq!(e.to_string(), "action `cat' requires 1 argument(s)");
    }

    #[test]
    fn out_of_bounds_frames_are_not_allocation_failures() {
        let oob = FrameOutOfBounds {
            frame: PhysicalPage::from_frame_number(0x4_0000),
        };
        assert_eq!(
            StepError::from(AddressSpaceError::FrameOutOfBounds(oob)),
            StepError::FrameOutOfBounds(oob)
        );
        assert_eq!(
            StepError::from(AddressSpaceError::OutOfMemory { level: Level::Pt }).to_string(),
            "allocation failure: out of memory allocating a PT table"
        );
    }

    #[test]
    fn large_page_conflicts_are_not_allocation_failures() {
        let e = AddressSpaceError::LargePageInTheWay { level: Level::Pd };
        assert_eq!(StepError::from(e), StepError::Mapping(e));
        assert_eq!(
            StepError::from(e).to_string(),
            "mapping conflict: large page at PD level blocks a 4 KiB mapping"
        );
    }

    #[test]
    fn borrowed_errors_convert_into_boot_errors() {
        let e: BootError<'_> = OptionError::MissingValue { name: "-rs" }.into();
        assert_eq!(e.to_string(), "option `-rs' requires a value");

        let e: BootError<'_> = ActionError::UnknownAction { name: "frobnicate" }.into();
        assert_eq!(e.to_string(), "unknown action `frobnicate' (use -h for help)");
    }
}
