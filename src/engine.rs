use crate::context::Context;
use crate::directive::{scan_line, Directive};
use crate::errors::{PreprocessError, Result};
use crate::expression::{evaluate_condition, ExprError};
use crate::skip_stack::SkipStack;
use itertools::Itertools;
use tracing::{debug, trace};

/// =========================
/// Driver
/// =========================

/// Run the directive state machine over `source`.
///
/// Lines are split on `\n` and re-joined with `\n`; a `\r` before the
/// newline stays part of its line, so CRLF text round-trips. Directive
/// lines never reach the output. The first error aborts the whole call.
pub fn process_with_context(source: &str, ctx: &Context) -> Result<String> {
    let mut stack = SkipStack::new();
    let mut output: Vec<std::borrow::Cow<'_, str>> = Vec::new();

    for (idx, line) in source.split('\n').enumerate() {
        let line_no = idx + 1;
        match scan_line(line) {
            Directive::IfOpen { condition } => {
                // Conditions are checked even inside suppressed regions.
                let result = eval_at(condition, ctx, line_no)?;
                stack.open(result, line_no);
                trace!(
                    line = line_no,
                    condition,
                    result,
                    depth = stack.depth(),
                    skip = stack.is_skipping(),
                    "open"
                );
            }
            Directive::EndifClose => {
                stack.close(line_no)?;
                trace!(
                    line = line_no,
                    depth = stack.depth(),
                    skip = stack.is_skipping(),
                    "close"
                );
            }
            _ if stack.is_skipping() => {}
            Directive::Inline(inline) => {
                let result = eval_at(inline.condition, ctx, line_no)?;
                trace!(line = line_no, condition = inline.condition, result, "inline");
                output.push(inline.rewrite(result).into());
            }
            Directive::Text => output.push(line.into()),
        }
    }
    stack.finish()?;

    debug!(kept = output.len(), "preprocessed");
    Ok(output.iter().join("\n"))
}

fn eval_at(condition: &str, ctx: &Context, line: usize) -> Result<bool> {
    evaluate_condition(condition, ctx).map_err(|e| evaluation_error(condition, e, ctx, line))
}

fn evaluation_error(expression: &str, err: ExprError, ctx: &Context, line: usize) -> PreprocessError {
    PreprocessError::Evaluation {
        expression: expression.to_string(),
        message: err.to_string(),
        context: ctx.to_string(),
        line: Some(line),
    }
}
