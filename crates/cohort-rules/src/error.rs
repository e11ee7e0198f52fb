use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("rule {rule} requires parameter {parameter}, which was not supplied")]
    MissingMandatoryParameter {
        rule: &'static str,
        parameter: &'static str,
    },
    #[error("no rule registered under {0:?}")]
    UnknownRule(String),
    #[error("rule {0} is disabled")]
    DisabledRule(String),
    #[error("invalid rule settings: {0}")]
    Settings(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
