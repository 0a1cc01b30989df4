//! Statistical helpers shared by the power-simulation crates.
//!
//! This crate provides the small amount of inferential and descriptive machinery the
//! pipeline needs once a model has been fitted:
//!
//! - **Descriptive statistics**: mean, median, variance and spread of per-trial values
//! - **Tail probabilities**: standard normal CDF, two-sided Wald p-values and
//!   two-sided Student-t p-values
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing trial estimates
//! - [`distribution`]: Reference distributions used to turn test statistics into p-values
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use powersim_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Two-sided p-value of a Wald statistic
//!
//! ```
//! use powersim_stats::distribution;
//!
//! let p = distribution::wald_p_value(1.959_963_984_540_054);
//! assert!((p - 0.05).abs() < 1e-9);
//! ```

pub mod descriptive;
pub mod distribution;
