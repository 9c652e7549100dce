//! Domain layer: billing value types, the outcome classifier and the ports
//! through which the core reaches payment and storage capabilities.

pub mod invoice;
pub mod money;
pub mod outcome;
pub mod ports;
