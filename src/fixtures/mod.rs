pub mod tracker;
pub mod users;

pub use tracker::{sweep_promos, FixtureKind, FixtureTracker, TeardownReport};
pub use users::{unique_suffix, UserFactory};
