//! Error type shared by the runtime.

use crate::engine::Path;

/// Everything that can go wrong while configuring a root or running a pass.
///
/// None of these are retried: they are either contract violations by the
/// caller or failures raised by component bodies.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    /// `configure` was called without a live container element.
    #[error("a container element is required")]
    MissingContainer,
    /// `configure` was called with a root that normalizes to nothing.
    #[error("a root node is required")]
    MissingRoot,
    /// A hook was called while no render pass was running.
    #[error("`{hook}` called outside of a render pass")]
    NoActiveRuntime { hook: &'static str },
    /// A hook was called outside of a component body.
    #[error("`{hook}` must be called inside a component body")]
    HookOutsideComponent { hook: &'static str },
    /// The cell at the cursor does not fit the hook reading it. Hook calls
    /// changed order or count between renders.
    #[error("`{hook}` call #{index} at `{path}` found a {found} cell")]
    HookMismatch {
        hook: &'static str,
        path: Path,
        index: usize,
        found: &'static str,
    },
    /// Raised by a component body. Turned into [`RenderError::Component`]
    /// once it leaves the body.
    #[error("{0}")]
    Failed(String),
    /// A component body failed.
    #[error("component at `{path}` failed: {message}")]
    Component { path: Path, message: String },
}

impl RenderError {
    /// Failure raised from inside a component body.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Attach the path of the component whose body raised this error.
    pub(crate) fn at(self, path: &Path) -> Self {
        match self {
            Self::Failed(message) => Self::Component {
                path: path.clone(),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_gets_path() {
        let error = RenderError::failed("boom").at(&Path::from("/App/idx:0"));
        assert_eq!(error.to_string(), "component at `/App/idx:0` failed: boom");
    }

    #[test]
    fn test_other_errors_keep_their_shape() {
        let error = RenderError::HookOutsideComponent { hook: "use_state" }.at(&Path::root());
        assert!(matches!(error, RenderError::HookOutsideComponent { hook: "use_state" }));
    }
}
