/*
[INPUT]:  Bitfinex v2 wire schema and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

pub mod enums;
pub mod messages;
pub mod requests;
pub mod serde_util;

pub use enums::*;
pub use messages::*;
pub use requests::*;
