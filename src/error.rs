use std::fmt;

/// Errors produced by the repeater core.
///
/// Nothing is retried internally: synchronous operations return these to
/// the caller, the dispatch loop logs them and drops the offending
/// packet/sink pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmrError {
    /// Argument or state precondition violated.
    Invalid(&'static str),
    /// Ingress queue at capacity; the packet was dropped.
    QueueFull,
    /// A framing codec rejected its input.
    Codec(&'static str),
    /// Dispatch thread spawn or join failure.
    Thread(String),
}

impl fmt::Display for DmrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid: {msg}"),
            Self::QueueFull => write!(f, "ingress queue full"),
            Self::Codec(msg) => write!(f, "codec: {msg}"),
            Self::Thread(msg) => write!(f, "thread: {msg}"),
        }
    }
}

impl std::error::Error for DmrError {}

pub type Result<T> = std::result::Result<T, DmrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let e = DmrError::Invalid("color code out of range");
        assert_eq!(e.to_string(), "invalid: color code out of range");
        assert_eq!(DmrError::QueueFull.to_string(), "ingress queue full");
    }
}
