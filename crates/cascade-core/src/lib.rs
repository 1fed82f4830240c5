//! Simulation engine for workforce automation scenarios.
//!
//! Two execution modes share one cascade: `CascadeEngine` computes the
//! theoretical steady-state impact of a stimulus in a single pass, and
//! `SimulationRun` replays that impact month by month through adoption
//! diffusion, human-factor stocks, and cash flow.

pub mod adoption;
pub mod cascade;
pub mod demo;
pub mod feedback;
pub mod financial;
pub mod human_factors;
pub mod scope_provider;
pub mod simulation;
pub mod stimulus;
pub mod sweep;
pub mod technology;

pub use adoption::BassDiffusion;
pub use cascade::{CascadeEngine, CascadeTables};
pub use demo::demo_scope;
pub use financial::FinancialModel;
pub use human_factors::{HumanFactorConfig, HumanFactorEngine, MonthContext};
pub use scope_provider::{InMemoryScopeProvider, ScopeProvider};
pub use simulation::{SimulationRun, MAX_TIMELINE_MONTHS};
pub use stimulus::{Stimulus, TechnologyCost};
pub use sweep::{run_sweep, SweepConfig, SweepSummary};
pub use technology::TechnologyCatalog;
