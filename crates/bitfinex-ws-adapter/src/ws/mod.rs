/*
[INPUT]:  Transport events and caller commands
[OUTPUT]: Public market data and authenticated trading feeds
[POS]:    WebSocket layer - feed state machines
[UPDATE]: When adding feeds or handler kinds
*/

mod connection;
pub mod handler;
pub mod market;
pub mod trading;

pub use connection::ConnectionState;
pub use handler::{FeedEvent, FeedHandler};
pub use market::{BookOptions, MarketDataChannel};
pub use trading::TradingSession;
