pub mod classifier;
pub mod gate;
pub mod responder;

pub use classifier::{classify, Classification, QueryIntent};
pub use gate::{EscalationGate, EscalationReason, RouteDecision};
pub use responder::render;
