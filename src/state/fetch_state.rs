/// Per-book state definitions for tracking pipeline progress
///
/// A book moves through `Init -> ContentFetched -> DetailFetched -> Parsed ->
/// Stored -> Done`; `NotFound` and `Exhausted` can be reached from any fetch
/// state.
use std::fmt;

/// Represents the current state of one book id in the fetch pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    // ===== Active States =====
    /// Nothing fetched yet for this id
    Init,

    /// The text body was downloaded and passed the redirect check
    ContentFetched,

    /// The detail page was downloaded and passed the redirect check
    DetailFetched,

    /// The detail page was parsed into a book record
    Parsed,

    /// Text and cover were written to disk
    Stored,

    // ===== Terminal States =====
    /// Book fully processed
    Done,

    /// Catalog redirected one of the requests
    NotFound,

    /// Transport failures used up every attempt
    Exhausted,
}

impl FetchState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::NotFound | Self::Exhausted)
    }

    /// Returns true while a network request may still be issued for the book
    pub fn is_fetching(&self) -> bool {
        matches!(
            self,
            Self::Init | Self::ContentFetched | Self::DetailFetched | Self::Parsed
        )
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: FetchState) -> bool {
        match (self, next) {
            (Self::Init, Self::ContentFetched)
            | (Self::ContentFetched, Self::DetailFetched)
            | (Self::DetailFetched, Self::Parsed)
            | (Self::Parsed, Self::Stored)
            | (Self::Stored, Self::Done) => true,
            (from, Self::NotFound | Self::Exhausted) => from.is_fetching(),
            _ => false,
        }
    }

    /// Moves to `next`, rejecting transitions outside the pipeline order
    pub fn advance(&mut self, next: FetchState) -> crate::Result<()> {
        if !self.can_transition_to(next) {
            return Err(crate::TululuError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::trace!("fetch state {} -> {}", self, next);
        *self = next;
        Ok(())
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ContentFetched => "content_fetched",
            Self::DetailFetched => "detail_fetched",
            Self::Parsed => "parsed",
            Self::Stored => "stored",
            Self::Done => "done",
            Self::NotFound => "not_found",
            Self::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = FetchState::Init;
        for next in [
            FetchState::ContentFetched,
            FetchState::DetailFetched,
            FetchState::Parsed,
            FetchState::Stored,
            FetchState::Done,
        ] {
            state.advance(next).unwrap();
        }
        assert_eq!(state, FetchState::Done);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_skipping_a_step_is_rejected() {
        let mut state = FetchState::Init;
        let err = state.advance(FetchState::Parsed).unwrap_err();
        assert!(matches!(
            err,
            crate::TululuError::InvalidTransition {
                from: FetchState::Init,
                to: FetchState::Parsed
            }
        ));
        assert_eq!(state, FetchState::Init);
    }

    #[test]
    fn test_failure_exits_from_fetch_states() {
        for from in [
            FetchState::Init,
            FetchState::ContentFetched,
            FetchState::DetailFetched,
            FetchState::Parsed,
        ] {
            assert!(from.can_transition_to(FetchState::NotFound));
            assert!(from.can_transition_to(FetchState::Exhausted));
        }

        assert!(!FetchState::Stored.can_transition_to(FetchState::NotFound));
        assert!(!FetchState::Done.can_transition_to(FetchState::Exhausted));
    }

    #[test]
    fn test_terminal_states() {
        assert!(FetchState::Done.is_terminal());
        assert!(FetchState::NotFound.is_terminal());
        assert!(FetchState::Exhausted.is_terminal());
        assert!(!FetchState::Parsed.is_terminal());
        assert!(!FetchState::Stored.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", FetchState::ContentFetched), "content_fetched");
        assert_eq!(format!("{}", FetchState::NotFound), "not_found");
    }
}
