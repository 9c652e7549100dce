//! CSV surface of the reconciler: seed files in, reports out.

pub mod csv;
