use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToastError {
    /// The toast API was requested outside of any provider scope
    #[error("No toast provider in scope: use_toast must be called inside ToastProvider::scope")]
    NoProvider,

    /// A handle outlived the provider that issued it
    #[error("Toast provider has been shut down")]
    ProviderGone,

    #[error("Toast provider must be created inside a tokio runtime")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Render error: {0}")]
    Render(String),
}

impl ToastError {
    /// Integration mistakes that should surface to the developer immediately
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ToastError::NoProvider | ToastError::ProviderGone | ToastError::NoRuntime
        )
    }
}

pub type Result<T> = std::result::Result<T, ToastError>;
