/// Outcome of a single rule evaluation.
///
/// The third state is load-bearing: a pending asynchronous check is neither
/// valid nor invalid, and it propagates through field and form aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The value passes the rule.
    Valid,
    /// The value fails the rule.
    Invalid,
    /// An asynchronous check is in flight.
    Pending,
}

impl Verdict {
    /// `true` only for [`Verdict::Valid`].
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Combine two verdicts; the first non-valid one wins, so `Invalid` and
    /// `Pending` both poison the aggregate.
    pub fn and(self, other: Verdict) -> Verdict {
        match self {
            Self::Valid => other,
            poisoned => poisoned,
        }
    }
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid { Self::Valid } else { Self::Invalid }
    }
}

/// Which configured message a rule should resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageKind {
    /// The failure message shown in the `Invalid` state.
    #[default]
    Message,
    /// The message shown while an asynchronous check is in flight.
    AsyncMessage,
}
