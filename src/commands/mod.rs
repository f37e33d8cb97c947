pub mod link;

pub use link::{LinkCommand, LinkOutcome};
