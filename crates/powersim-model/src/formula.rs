use std::fmt;

use serde::{Deserialize, Serialize};

/// Population-level terms of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixedTerm {
    Intercept,
    /// The deviation-coded predictor column
    Predictor,
}

impl FixedTerm {
    /// Coefficient name as it appears in model output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Intercept => "(Intercept)",
            Self::Predictor => "condition",
        }
    }
}

/// Grouping factor of a random-effects term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grouping {
    Subject,
    Item,
}

impl Grouping {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Item => "item",
        }
    }
}

/// A random intercept, optionally with a correlated random slope of the
/// predictor, varying over one grouping factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomTerm {
    pub grouping: Grouping,
    pub slope: bool,
}

impl RandomTerm {
    #[must_use]
    pub const fn intercept(grouping: Grouping) -> Self {
        Self {
            grouping,
            slope: false,
        }
    }

    #[must_use]
    pub const fn intercept_and_slope(grouping: Grouping) -> Self {
        Self {
            grouping,
            slope: true,
        }
    }

    /// Number of random coefficients per level of the grouping factor.
    #[must_use]
    pub const fn dim(&self) -> usize {
        if self.slope { 2 } else { 1 }
    }

    #[must_use]
    pub fn coefficient_names(&self) -> Vec<&'static str> {
        if self.slope {
            vec![FixedTerm::Intercept.name(), FixedTerm::Predictor.name()]
        } else {
            vec![FixedTerm::Intercept.name()]
        }
    }
}

/// Model formula for the response column.
///
/// Displays in the familiar mixed-model syntax:
///
/// ```
/// use powersim_model::Formula;
///
/// assert_eq!(
///     Formula::crossed().to_string(),
///     "response ~ 1 + condition + (1 + condition | subject) + (1 | item)",
/// );
/// assert_eq!(Formula::one_sample().to_string(), "response ~ 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub fixed: Vec<FixedTerm>,
    pub random: Vec<RandomTerm>,
}

impl Formula {
    /// `response ~ 1`: a plain linear model, i.e. the one-sample t-test.
    #[must_use]
    pub fn one_sample() -> Self {
        Self {
            fixed: vec![FixedTerm::Intercept],
            random: vec![],
        }
    }

    /// `response ~ 1 + (1 | subject)`
    #[must_use]
    pub fn single_factor() -> Self {
        Self {
            fixed: vec![FixedTerm::Intercept],
            random: vec![RandomTerm::intercept(Grouping::Subject)],
        }
    }

    /// `response ~ 1 + condition + (1 + condition | subject) + (1 | item)`
    #[must_use]
    pub fn crossed() -> Self {
        Self {
            fixed: vec![FixedTerm::Intercept, FixedTerm::Predictor],
            random: vec![
                RandomTerm::intercept_and_slope(Grouping::Subject),
                RandomTerm::intercept(Grouping::Item),
            ],
        }
    }

    #[must_use]
    pub fn is_mixed(&self) -> bool {
        !self.random.is_empty()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = self.fixed.iter().map(|term| match term {
            FixedTerm::Intercept => "1",
            FixedTerm::Predictor => "condition",
        });
        let random = self.random.iter().map(|term| {
            let lhs = if term.slope { "1 + condition" } else { "1" };
            format!("({lhs} | {})", term.grouping.name())
        });
        let rhs = fixed.map(str::to_owned).chain(random).collect::<Vec<_>>();
        write!(f, "response ~ {}", rhs.join(" + "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_factor_display() {
        assert_eq!(
            Formula::single_factor().to_string(),
            "response ~ 1 + (1 | subject)"
        );
    }

    #[test]
    fn test_term_dimensions() {
        let formula = Formula::crossed();
        let dims = formula.random.iter().map(RandomTerm::dim).collect::<Vec<_>>();
        assert_eq!(dims, [2, 1]);
        assert!(formula.is_mixed());
        assert!(!Formula::one_sample().is_mixed());
    }
}
