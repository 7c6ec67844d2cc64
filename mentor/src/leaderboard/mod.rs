//! Leaderboard module
//!
//! Terminal and HTML rendering of ranked evaluations.

pub mod renderer;

pub use renderer::{render_dashboard_html, render_group_detail, render_table};
