//! Presentation layer independent of rendering: key figures, tables and chart
//! specifications computed from the recoded table and the control state.

pub mod chart;
pub mod dashboard;
