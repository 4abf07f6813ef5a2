pub mod camera;
pub mod command;
pub mod grid;
pub mod hit_test;
pub mod input;
pub mod macro_edit;
pub mod resolver;
pub mod selection;
pub mod viewer;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum EngineError {
        #[error("cannot fit view to empty or zero-extent bounds")]
        DegenerateBounds,
        #[error("macro edit requires exactly one highlighted component, found {highlighted}")]
        NotSingleSelection { highlighted: usize },
        #[error("component with id {0} not found")]
        ComponentNotFound(u64),
    }
}
