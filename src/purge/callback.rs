/// Answer of a decision callback for one deletion candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    /// Delete, whatever the rules computed
    Delete,
    /// Keep, whatever the rules computed (the CLI answers this on dry runs)
    Keep,
    /// No opinion: the computed default stands
    #[default]
    UseDefault,
}

impl Decision {
    /// Final decision given the computed default
    pub fn resolve(self, default: bool) -> bool {
        match self {
            Decision::Delete => true,
            Decision::Keep => false,
            Decision::UseDefault => default,
        }
    }
}

impl From<bool> for Decision {
    fn from(delete: bool) -> Self {
        if delete {
            Decision::Delete
        } else {
            Decision::Keep
        }
    }
}

impl From<Option<bool>> for Decision {
    fn from(answer: Option<bool>) -> Self {
        answer.map(Decision::from).unwrap_or_default()
    }
}

/// Observer/veto hook consulted once per deletion candidate, before
/// anything is deleted, whether or not the candidate ends up deleted.
///
/// Implemented for every `FnMut(&S, bool) -> Decision`, where the `bool`
/// is the default decision computed by the engine.
pub trait DecisionCallback<S: ?Sized> {
    fn decide(&mut self, subject: &S, default: bool) -> Decision;
}

impl<S, F> DecisionCallback<S> for F
where
    S: ?Sized,
    F: FnMut(&S, bool) -> Decision,
{
    fn decide(&mut self, subject: &S, default: bool) -> Decision {
        self(subject, default)
    }
}

/// Callback that never overrides anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseDefaults;

impl<S: ?Sized> DecisionCallback<S> for UseDefaults {
    fn decide(&mut self, _subject: &S, _default: bool) -> Decision {
        Decision::UseDefault
    }
}

/// Consult the callback exactly once and return the final decision.
pub(crate) fn consult<S, C>(callback: &mut C, subject: &S, default: bool) -> bool
where
    S: ?Sized,
    C: DecisionCallback<S> + ?Sized,
{
    callback.decide(subject, default).resolve(default)
}
