use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("outdated data: stored {field} is newer than the submitted value")]
    OutdatedData { field: &'static str },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("round can only be finalized by the server that created it")]
    NotRoundOwner,
    #[error("round has already been finalized")]
    AlreadyFinalized,
}
