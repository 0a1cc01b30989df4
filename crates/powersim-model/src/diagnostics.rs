//! Capture boundary for non-fatal fitting conditions.
//!
//! Iterative fits routinely raise conditions that are not errors: a singular
//! (boundary) covariance estimate, an optimizer that stopped early, a gradient
//! check that did not pass. During a sweep of thousands of fits these must not
//! reach the user, but the information must not be lost either.
//!
//! Fitters push such conditions into a [`Diagnostics`] sink instead of printing
//! them. [`capture_diagnostics`] runs a fit with a fresh sink, forwards the
//! collected conditions to `tracing` at `TRACE` level and hands them back next to
//! the fit result. Errors are returned unchanged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    Warning,
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub text: String,
}

/// Sink collecting the conditions raised while fitting one model.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    conditions: Vec<Condition>,
}

impl Diagnostics {
    pub fn warn<S>(&mut self, text: S)
    where
        S: Into<String>,
    {
        self.conditions.push(Condition {
            kind: ConditionKind::Warning,
            text: text.into(),
        });
    }

    pub fn message<S>(&mut self, text: S)
    where
        S: Into<String>,
    {
        self.conditions.push(Condition {
            kind: ConditionKind::Message,
            text: text.into(),
        });
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> + '_ {
        self.conditions
            .iter()
            .filter(|c| c.kind == ConditionKind::Warning)
            .map(|c| c.text.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Runs `f` with a fresh diagnostics sink and returns its result together with
/// everything it raised.
///
/// ```
/// use powersim_model::diagnostics::capture_diagnostics;
///
/// let (value, diagnostics) = capture_diagnostics(|sink| {
///     sink.message("boundary (singular) fit");
///     Ok::<_, std::fmt::Error>(42)
/// });
/// assert_eq!(value.unwrap(), 42);
/// assert_eq!(diagnostics.conditions().len(), 1);
/// ```
pub fn capture_diagnostics<T, F>(f: F) -> (T, Diagnostics)
where
    F: FnOnce(&mut Diagnostics) -> T,
{
    let mut sink = Diagnostics::default();
    let value = f(&mut sink);
    for condition in &sink.conditions {
        tracing::trace!(kind = ?condition.kind, "{}", condition.text);
    }
    (value, sink)
}
