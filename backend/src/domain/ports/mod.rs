//! Domain ports and supporting types for the hexagonal boundary.

mod harbor_repository;

#[cfg(test)]
pub use harbor_repository::MockHarborRepository;
pub use harbor_repository::{FixtureHarborRepository, HarborRepository, HarborRepositoryError};
