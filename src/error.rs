use std::fmt;
use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlistError>;

/// Which end of the print range a setter rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Start,
    End,
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Start => f.write_str("start"),
            RangeBound::End => f.write_str("end"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SlistError {
    #[error("index {index} outside list range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cannot {op} from empty list")]
    EmptyList { op: &'static str },
    #[error("no current element set")]
    NoCurrentElement,
    #[error("{0} parameter outside list bounds")]
    RangeOutOfBounds(RangeBound),
    #[error("end parameter {end} less than start parameter {start}")]
    RangeOrderViolation { start: usize, end: usize },
    #[error("print sink failed: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        assert_eq!(
            SlistError::EmptyList { op: "delete" }.to_string(),
            "cannot delete from empty list"
        );
        assert_eq!(
            SlistError::RangeOutOfBounds(RangeBound::Start).to_string(),
            "start parameter outside list bounds"
        );
        assert_eq!(
            SlistError::RangeOutOfBounds(RangeBound::End).to_string(),
            "end parameter outside list bounds"
        );
        assert_eq!(
            SlistError::IndexOutOfRange { index: 7, len: 3 }.to_string(),
            "index 7 outside list range (len 3)"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: SlistError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert!(matches!(err, SlistError::Io(_)));
    }
}
