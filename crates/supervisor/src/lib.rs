pub mod ecosystem;
pub mod runner;

pub use ecosystem::{Ecosystem, EcosystemError, WorkUnit};
pub use runner::{RestartDecision, RestartPolicy, Supervisor, UnitOutcome, UnitRunner};
