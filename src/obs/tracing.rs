// crates.io
use tracing::{Instrument, Span, instrument::Instrumented, span::EnteredSpan};
// self
use crate::{_prelude::*, obs::Operation};

/// Span wrapper used by relay operations.
#[derive(Clone, Debug)]
pub struct CallSpan {
	span: Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		let span = tracing::info_span!("helix_relay.call", operation = operation.as_str(), stage);

		Self { span }
	}

	/// Enters the span for synchronous sections.
	pub fn entered(&self) -> CallSpanGuard {
		CallSpanGuard { _guard: self.span.clone().entered() }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

/// RAII guard returned by [`CallSpan::entered`].
pub struct CallSpanGuard {
	_guard: EnteredSpan,
}
impl Debug for CallSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CallSpanGuard(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn guard_enters_without_subscriber() {
		let _guard = CallSpan::new(Operation::TokenRefresh, "test").entered();
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(Operation::Categories, "instrument_wraps_future");
		let value = CallSpan::instrument(&span, async { 42 }).await;

		assert_eq!(value, 42);
	}
}
