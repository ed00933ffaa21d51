pub mod polar;
pub mod stats;

pub use polar::PolarHelper;
pub use stats::StatsHelper;
