//! External collaborators: live price lookup.

mod price;

pub use price::{PriceClient, PriceQuote};
