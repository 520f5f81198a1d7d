pub mod errors;
pub mod defines;
pub mod context;
pub mod engine;
pub mod expression;
pub mod directive;
pub mod request;
mod skip_stack;
mod parser;
mod comparison;

use context::Context;
use errors::Result;
use tracing::debug;

/// The main preprocessor. Builds the context once from the defines and
/// can then process any number of sources; `process` takes `&self`, so a
/// single instance may be shared across threads.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    ctx: Context,
}

impl Preprocessor {
    pub fn new(defines: &Defines) -> Self {
        debug!(defines = defines.len(), "building context");
        Self {
            ctx: Context::build(defines),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Strip directive lines and suppressed regions from `source`.
    pub fn process(&self, source: &str) -> Result<String> {
        engine::process_with_context(source, &self.ctx)
    }
}

/// Convenience: build the context and process `source` in one call.
pub fn process(source: &str, defines: &Defines) -> Result<String> {
    Preprocessor::new(defines).process(source)
}

/// Re-export the most-used types.
pub use defines::{Defines, Scalar};
pub use errors::{ErrorKind, PreprocessError};
pub use request::{derive_defines, RequestHeaders};
