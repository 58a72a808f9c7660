//! Timing metrics comparing the parsed trace with its rewritten times.
//!
//! Primitives must have been refreshed from the graph (see
//! `output::render_trace`) for the "after" figures to be meaningful.

use super::schema::{MakespanChange, RankSpan, Span};
use crate::parser::{CategoryKind, ParsedTrace, Primitive, Rank};
use log::debug;
use std::collections::BTreeMap;

/// Activity span of every rank, messages excluded
pub fn rank_spans(trace: &ParsedTrace) -> Vec<RankSpan> {
    let mut spans: BTreeMap<Rank, RankSpan> = BTreeMap::new();

    for primitive in &trace.primitives {
        if trace.categories.kind_of(primitive.category) == Some(CategoryKind::Message) {
            continue;
        }
        let (before_start, before_end) = primitive.original_span();
        let before = Span {
            start: before_start,
            end: before_end,
        };
        let after = Span {
            start: primitive.start_time,
            end: primitive.end_time,
        };

        spans
            .entry(primitive.from_rank)
            .and_modify(|span| {
                span.before = widen(span.before, before);
                span.after = widen(span.after, after);
            })
            .or_insert(RankSpan {
                rank: primitive.from_rank,
                before,
                after,
            });
    }

    debug!("Computed spans for {} ranks", spans.len());
    spans.into_values().collect()
}

/// Overall trace duration before and after
pub fn calculate_makespan(primitives: &[Primitive]) -> MakespanChange {
    let before = envelope(primitives.iter().map(|p| {
        let (start, end) = p.original_span();
        Span { start, end }
    }));
    let after = envelope(primitives.iter().map(|p| Span {
        start: p.start_time,
        end: p.end_time,
    }));

    MakespanChange::new(
        before.map_or(0.0, |s| s.duration()),
        after.map_or(0.0, |s| s.duration()),
    )
}

fn envelope(spans: impl Iterator<Item = Span>) -> Option<Span> {
    spans.reduce(widen)
}

fn widen(a: Span, b: Span) -> Span {
    Span {
        start: a.start.min(b.start),
        end: a.end.max(b.end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_makespan_unchanged() {
        let primitives = vec![Primitive::new(0.0, 2.0, 0, 0, 0), Primitive::new(3.0, 5.0, 1, 1, 0)];
        let change = calculate_makespan(&primitives);

        assert_eq!(change.before, 5.0);
        assert_eq!(change.after, 5.0);
        assert_eq!(change.speedup, Some(1.0));
    }

    #[test]
    fn test_makespan_after_speedup() {
        let mut primitives = vec![Primitive::new(0.0, 2.0, 0, 0, 0), Primitive::new(3.0, 8.0, 1, 1, 0)];
        primitives[1].start_time = 2.0;
        primitives[1].end_time = 4.0;

        let change = calculate_makespan(&primitives);
        assert_eq!(change.before, 8.0);
        assert_eq!(change.after, 4.0);
        assert_eq!(change.speedup, Some(2.0));
    }

    #[test]
    fn test_makespan_empty() {
        let change = calculate_makespan(&[]);
        assert_eq!(change.before, 0.0);
        assert_eq!(change.speedup, None);
    }
}
