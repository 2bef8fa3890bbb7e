//! Application services.

pub mod highlight;
