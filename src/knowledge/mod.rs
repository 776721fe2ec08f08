pub mod store;
pub mod types;

pub use store::{InMemoryKnowledge, TaskKnowledge};
pub use types::{StepInfo, TaskDefinition};
