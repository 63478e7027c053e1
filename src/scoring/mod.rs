//! Quality scoring
//!
//! Reduces the issue list and the metric records to a single 0-100 score.
//! The score reflects both problems found AND positive structural
//! qualities.
//!
//! # Scoring Formula
//!
//! ```text
//! Overall = Structure × W₁ + Quality × W₂ + Architecture × W₃
//!
//! Where each pillar score:
//!   Pillar  = clamp(100 - penalty + capped_bonus, 0, 100)
//!   Penalty = Σ severity_points × kind_weight / size_factor   (per issue)
//!   size_factor = max(√(types + methods), 5)
//!   Bonus capped at bonus_cap_ratio × penalty (bonuses can't fully mask issues)
//! ```
//!
//! # Severity points
//!
//! - Critical: 10.0
//! - High: 5.0
//! - Medium: 1.5
//! - Low: 0.3
//!
//! # Bonuses (positive signals)
//!
//! - **Modularity** (0-10 pts, Architecture): types close to the main sequence
//! - **Clean dependencies** (0-10 pts, Architecture): no type cycles
//! - **Cohesion** (0-5 pts, Quality): high mean TCC
//! - **Complexity distribution** (0-5 pts, Structure): most methods are simple
//!
//! Issues are counted per (kind, severity) in ordered maps before any
//! arithmetic, so permuting the issue list never changes the score.

mod quality_scorer;

pub use quality_scorer::{PillarScore, QualityScore, QualityScorer, ScoreSignals};
