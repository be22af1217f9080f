#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database handle is null")]
    NullHandle,

    #[error("failed to register table function `{name}`")]
    Registration {
        name: &'static str,
        #[source]
        source: duckdb::Error,
    },
}
