//! The branch-track recorder (C9). A passive observer of the driver and the branch arena: every
//! fork, join, activation, deactivation, and pursued logical line is appended as one [`Event`].
//! The event stream is the textual source an external tool renders into an SVG timeline, so its
//! shape is kept stable and line-oriented rather than tied to any particular serialization crate.

use std::io::Write as _;

/// The kind of thing that happened to the branch tree. Mirrors the `ccbranch_*` event names the
/// visualizer schema expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
	LogicalLinePursue,
	Fork,
	Join,
	JoinForks,
	Activate,
	Deactivate,
}

impl EventKind {
	const fn name(&self) -> &'static str {
		match self {
			Self::LogicalLinePursue => "logic_line_pursue",
			Self::Fork => "ccbranch_fork",
			Self::Join => "ccbranch_join",
			Self::JoinForks => "ccbranch_join_forks",
			Self::Activate => "ccbranch_activate",
			Self::Deactivate => "ccbranch_deactivate",
		}
	}
}

/// One recorded event. Every field beyond `kind` and `branch_id` is optional because different
/// event kinds populate different subsets -- a `Fork` has `parent_id` and no `first_id`/`second_id`,
/// a `Join` has both.
#[derive(Debug, Clone, Default)]
pub struct Event {
	pub kind: Option<EventKind>,
	pub branch_id: String,
	pub fork_id: Option<String>,
	pub parent_id: Option<String>,
	pub into_id: Option<String>,
	pub first_id: Option<String>,
	pub second_id: Option<String>,
	pub from_id: Option<String>,
	pub condition: Option<String>,
	pub content: Option<String>,
}

impl Event {
	/// Renders one event as a single `key=value` line, tab-separated, with `kind` first and
	/// `branch_id` second; the remaining fields appear only when present. This is not a
	/// general-purpose serialization format -- it exists solely so the visualizer can split on
	/// tabs and `=`.
	#[must_use]
	pub fn render(&self) -> String {
		let mut fields = vec![format!("kind={}", self.kind.as_ref().map_or("unknown", EventKind::name)), format!("branch_id={}", self.branch_id)];
		let optional = [
			("fork_id", &self.fork_id),
			("parent_id", &self.parent_id),
			("into_id", &self.into_id),
			("first_id", &self.first_id),
			("second_id", &self.second_id),
			("from_id", &self.from_id),
			("condition", &self.condition),
			("content", &self.content),
		];
		for (name, value) in optional {
			if let Some(value) = value {
				fields.push(format!("{name}={value}"));
			}
		}
		fields.join("\t")
	}
}

/// The recorder itself: an append-only event log, and a flag saying whether recording is enabled
/// at all. `track` enables it; `check`/`ls` leave it off so they pay no cost for events nobody
/// will read.
#[derive(Debug, Default)]
pub struct Recorder {
	enabled: bool,
	events: Vec<Event>,
}

impl Recorder {
	/// A recorder that discards everything pushed to it. The default for commands that don't
	/// need a branch track.
	#[must_use]
	pub fn disabled() -> Self {
		Self::default()
	}

	/// A recorder that actually retains events, for `track`.
	#[must_use]
	pub fn enabled() -> Self {
		Self { enabled: true, events: Vec::new() }
	}

	/// Appends an event if recording is enabled; a no-op otherwise.
	pub fn record(&mut self, event: Event) {
		if self.enabled {
			self.events.push(event);
		}
	}

	#[must_use]
	pub fn events(&self) -> &[Event] {
		&self.events
	}

	/// Writes every recorded event as newline-delimited records to `sink`.
	///
	/// # Errors
	/// Propagates any I/O error from writing to `sink`.
	pub fn write_to(&self, mut sink: impl std::io::Write) -> std::io::Result<()> {
		for event in &self.events {
			writeln!(sink, "{}", event.render())?;
		}
		sink.flush()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn disabled_recorder_drops_events() {
		let mut recorder = Recorder::disabled();
		recorder.record(Event { kind: Some(EventKind::Fork), branch_id: "*".to_owned(), ..Event::default() });
		assert!(recorder.events().is_empty());
	}

	#[test]
	fn enabled_recorder_keeps_events_in_order() {
		let mut recorder = Recorder::enabled();
		recorder.record(Event { kind: Some(EventKind::Fork), branch_id: "*".to_owned(), ..Event::default() });
		recorder.record(Event { kind: Some(EventKind::Join), branch_id: "*:1".to_owned(), ..Event::default() });
		assert_eq!(recorder.events().len(), 2);
		assert_eq!(recorder.events()[0].kind, Some(EventKind::Fork));
	}

	#[test]
	fn render_includes_only_present_optional_fields() {
		let event = Event { kind: Some(EventKind::Activate), branch_id: "*:1".to_owned(), ..Event::default() };
		let rendered = event.render();
		assert!(rendered.contains("kind=ccbranch_activate"));
		assert!(!rendered.contains("condition="));
	}
}
