// Job posting records. The description endpoints live in crate::generation.

pub mod handlers;
