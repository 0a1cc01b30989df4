pub mod fit_report;
pub mod power_table;
