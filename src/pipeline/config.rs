//! Runtime configuration.

use std::borrow::Cow;
use std::rc::Rc;

use super::mount::Runtime;
use super::scheduler::{MicrotaskQueue, RunSoon};
use crate::renderer::Document;

/// Path label for components without a declared name.
pub const DEFAULT_COMPONENT_FALLBACK: &str = "Component";

/// Tunables of one runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Label used in paths for anonymous components.
    pub component_fallback: Cow<'static, str>,
    /// Treat `selected` as a boolean DOM property (reflected), not a plain
    /// string attribute.
    pub reflect_selected: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            component_fallback: Cow::Borrowed(DEFAULT_COMPONENT_FALLBACK),
            reflect_selected: true,
        }
    }
}

/// Builder for [`Runtime`].
///
/// ```ignore
/// let queue = MicrotaskQueue::new();
/// let runtime = Runtime::builder()
///     .run_soon(queue.clone())
///     .component_fallback("Anonymous")
///     .build();
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
    document: Option<Document>,
    run_soon: Option<Rc<dyn RunSoon>>,
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render into an existing document.
    #[must_use]
    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Use a host-provided run-soon primitive instead of a private
    /// [`MicrotaskQueue`].
    #[must_use]
    pub fn run_soon(mut self, run_soon: impl RunSoon + 'static) -> Self {
        self.run_soon = Some(Rc::new(run_soon));
        self
    }

    #[must_use]
    pub fn component_fallback(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.config.component_fallback = label.into();
        self
    }

    #[must_use]
    pub fn reflect_selected(mut self, reflect: bool) -> Self {
        self.config.reflect_selected = reflect;
        self
    }

    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Runtime {
        let document = self.document.unwrap_or_default();
        match self.run_soon {
            Some(run_soon) => Runtime::from_parts(document, run_soon, None, self.config),
            None => {
                let queue = MicrotaskQueue::new();
                Runtime::from_parts(document, Rc::new(queue.clone()), Some(queue), self.config)
            }
        }
    }
}
