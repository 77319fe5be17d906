use tessera_client::ClientError;

use crate::launcher::InstanceId;
use crate::navigation::FrameId;

/// Failure inside an app builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("missing builder argument: {0}")]
    MissingArg(String),

    #[error("{0}")]
    Failed(String),

    #[error("builder panicked: {0}")]
    Panicked(String),
}

impl BuildError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("already at the root frame")]
    AtRoot,

    #[error("unknown frame: {0}")]
    UnknownFrame(FrameId),

    #[error("frame {0} is already on the stack")]
    AlreadyOnStack(FrameId),

    #[error("the home frame cannot be removed")]
    HomeFrame,

    #[error("stack index {index} out of range (depth {depth})")]
    IndexOutOfRange { index: usize, depth: usize },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("unknown app: {0}")]
    UnknownApp(String),

    #[error("no builder for app: {0}")]
    NoBuilder(String),

    #[error("unknown instance: {0}")]
    UnknownInstance(InstanceId),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_error_display() {
        assert_eq!(NavigationError::AtRoot.to_string(), "already at the root frame");
        let err = NavigationError::IndexOutOfRange { index: 4, depth: 2 };
        assert_eq!(err.to_string(), "stack index 4 out of range (depth 2)");
    }

    #[test]
    fn build_error_wraps_into_navigation() {
        let err: NavigationError = BuildError::failed("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
