//! Orchestrator errors and the policy deciding what happens to them.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed underlying cause of a provider failure.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failures surfaced by [`Unifont`](crate::Unifont).
#[derive(Debug, Error)]
pub enum UnifontError {
    /// A provider's `init` failed.
    #[error(
        "Could not initialize provider `{provider}`. `unifont` will not be able to process fonts provided by this provider."
    )]
    ProviderInit {
        provider: String,
        #[source]
        source: BoxError,
    },

    /// A provider's `resolve_font` failed.
    #[error("Could not resolve font face for `{family}` from `{provider}` provider.")]
    ProviderResolve {
        provider: String,
        family: String,
        #[source]
        source: BoxError,
    },

    /// A provider's `list_fonts` failed.
    #[error("Could not list names from `{provider}` provider.")]
    ProviderList {
        provider: String,
        #[source]
        source: BoxError,
    },

    /// A provider id passed to `resolve_font` or `list_fonts` is not in the
    /// stack.
    #[error("Could not find `{provider}` provider.")]
    UnknownProvider { provider: String },
}

impl UnifontError {
    /// Name of the provider involved.
    pub fn provider(&self) -> &str {
        match self {
            UnifontError::ProviderInit { provider, .. }
            | UnifontError::ProviderResolve { provider, .. }
            | UnifontError::ProviderList { provider, .. }
            | UnifontError::UnknownProvider { provider } => provider,
        }
    }
}

/// What to do with a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log the error and carry on as if the provider had no answer.
    #[default]
    Log,
    /// Return the error from the current call.
    Propagate,
}

impl ErrorPolicy {
    /// `Propagate` returns `err`; `Log` logs it with its cause chain and
    /// returns `Ok`.
    pub fn handle(self, err: UnifontError) -> Result<(), UnifontError> {
        match self {
            ErrorPolicy::Propagate => Err(err),
            ErrorPolicy::Log => {
                log::error!("{}", with_causes(&err));
                Ok(())
            }
        }
    }
}

/// `err: cause: cause...`
fn with_causes(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
