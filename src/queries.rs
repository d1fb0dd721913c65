//! Search query generation for one activist.
//!
//! Queries are derived deterministically from the activist's attributes, so
//! the same record always produces the same strings and per-query analytics
//! stay comparable across runs.
//!
//! Two tiers exist:
//! - [`primary_queries`]: three precise queries built around the quoted name.
//!   The orchestrator only consumes the first two of these by default.
//! - [`alternative_queries`]: a wider pool keyed on the vessel, nationality,
//!   and generic mission terms, for escalation when the primaries find
//!   nothing.

use crate::models::Activist;

/// The precise queries, most effective first. Always exactly three.
pub fn primary_queries(activist: &Activist) -> Vec<String> {
    let name = &activist.name;
    let boat = &activist.boatName;

    vec![
        format!("\"{name}\" detained released flotilla Gaza"),
        format!("\"{name}\" \"{boat}\" released"),
        format!("\"{name}\" humanitarian flotilla Israel news"),
    ]
}

/// The escalation pool: vessel-keyed, nationality-keyed, and generic mission
/// queries that may surface coverage not naming the activist directly.
pub fn alternative_queries(activist: &Activist) -> Vec<String> {
    let nationality = &activist.nationality;
    let boat = &activist.boatName;

    vec![
        // The vessel is often the headline subject.
        format!("\"{boat}\" detained released Gaza"),
        format!("\"{boat}\" humanitarian flotilla"),
        // Nationality-keyed coverage.
        format!("{nationality} activists Gaza flotilla 2024"),
        format!("{nationality} humanitarian workers detained"),
        // Generic mission coverage that may mention the activist.
        "Gaza flotilla activists detained released".to_string(),
        "humanitarian flotilla Gaza activists".to_string(),
        format!("{nationality} citizens Gaza flotilla"),
        format!("{nationality} activists Israel detained"),
    ]
}
