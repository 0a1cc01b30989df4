//! The parametric designs a power sweep can simulate.
//!
//! Each design is an immutable parameter record that implements
//! [`DataGenerator`]. Parameters are not validated up front: a malformed
//! setting surfaces as a [`DgpError`](crate::DgpError) from the step that cannot
//! be carried out (a distribution with a negative sd, a table whose columns do
//! not line up).

use rand::Rng;

use crate::{Dataset, DgpError};

pub use self::{crossed::CrossedDgp, one_sample::OneSampleDgp, single_factor::SingleFactorDgp};

mod crossed;
mod one_sample;
mod single_factor;

/// Builds one synthetic dataset per call from the caller's generator.
pub trait DataGenerator {
    fn generate<R>(&self, rng: &mut R) -> Result<Dataset, DgpError>
    where
        R: Rng + ?Sized;
}
