pub mod goldrush;

pub use goldrush::{goldrush_tools, GoldRushApi, GoldRushKind, GoldRushTool, Timeframe};
