//! Operators over [`Observable`](crate::observable::Observable).

pub mod take;
