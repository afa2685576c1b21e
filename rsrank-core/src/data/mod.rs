//! Market data: provider abstraction, the Polygon client, call pacing and
//! the tradable-universe filter.

pub mod pacer;
pub mod polygon;
pub mod provider;
pub mod universe;

pub use pacer::Pacer;
pub use polygon::{PolygonProvider, PolygonSettings};
pub use provider::{DataError, MarketDataProvider};
pub use universe::{filter_universe, is_common_stock_symbol};
