pub mod accumulator;
pub mod stat;

pub use accumulator::BlockAccumulator;
pub use stat::BlockStat;
