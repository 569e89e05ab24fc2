use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Clock '{id}' is already registered")]
    DuplicateClock { id: String },

    #[error("Clock '{id}' is not registered")]
    UnknownClock { id: String },

    #[error("Master clock already designated: '{id}'")]
    MasterAlreadyDesignated { id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type BoardResult<T> = Result<T, BoardError>;
