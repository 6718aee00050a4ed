use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("invalid payload: {0}")]
    Validation(String),
    #[error("request to the scheduler service failed")]
    Api(#[from] ApiError),
}

impl FormError {
    pub fn is_validation(&self) -> bool {
        matches!(self, FormError::Validation(_))
    }
}
