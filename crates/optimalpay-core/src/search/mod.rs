/// Priority-decomposed A* planning machinery
///
/// Balance discretization and state interning, the bounded best-first
/// frontier, candidate action generation, lookahead scoring, and the search
/// itself. HIGH and MEDIUM tiers are planned here; the LOW tier runs the
/// hybrid avalanche phase instead.
pub mod astar;
pub mod discretize;
pub mod frontier;
pub mod lookahead;
pub mod strategies;

pub use astar::{SearchDiagnostics, SearchLimits, TierPlan, TierSearch};
pub use frontier::{BoundedFrontier, EvictionPolicy};
pub use strategies::{Action, StrategyKind};
