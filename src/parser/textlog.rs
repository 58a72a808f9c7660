//! Main parser for slog2 textual traces.
//!
//! Two line kinds matter:
//!
//! ```text
//! Category[ index=2 name=MPI_Send topo=State color=... ]
//! Primitive[ TimeBBox(0.017361,0.017393) Category=2 (0.017361, 0) (0.017393, 1) ]
//! ```
//!
//! Every other line is ignored. Each primitive is expanded into graph
//! nodes as soon as it is read, so the per-rank chains grow in file order.

use super::category::{Category, CategoryKind, CategoryMap};
use super::primitive::{Primitive, Rank};
use crate::graph::{spawn_nodes, CausalGraph};
use crate::utils::config::{CATEGORY_LINE_PREFIX, PRIMITIVE_LINE_PREFIX};
use crate::utils::error::ParseError;
use log::debug;
use std::path::Path;

/// Parsed trace data (internal representation)
#[derive(Debug, Clone)]
pub struct ParsedTrace {
    /// Category lines exactly as read, for verbatim output
    pub category_lines: Vec<String>,
    pub categories: CategoryMap,
    /// Primitives in original file order
    pub primitives: Vec<Primitive>,
    /// Per-rank chains; message arrows are still pending
    pub graph: CausalGraph,
}

/// Fields extracted from a `Primitive[...]` line
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveFields {
    pub category: u32,
    pub kind: CategoryKind,
    pub start_time: f64,
    pub end_time: f64,
    pub start_text: String,
    pub end_text: String,
    pub from_rank: Rank,
    pub to_rank: Rank,
}

/// Parse a whole textual trace
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `input` - Whole trace text; lines other than categories and primitives are skipped
///
/// # Returns
/// Categories, primitives in file order, and the graph with every rank
/// chain built and message arrows still pending
///
/// # Errors
/// * `ParseError::Malformed` - a line could not be parsed
/// * `ParseError::UnknownCategory` - a primitive used an undefined category
pub fn parse_trace(input: &str) -> Result<ParsedTrace, ParseError> {
    let mut trace = ParsedTrace {
        category_lines: Vec::new(),
        categories: CategoryMap::new(),
        primitives: Vec::new(),
        graph: CausalGraph::new(),
    };

    for (index, line) in input.lines().enumerate() {
        process_line(&mut trace, line, index + 1)?;
    }

    debug!(
        "Parsed {} categories, {} primitives into {} nodes ({} pending arrows)",
        trace.categories.len(),
        trace.primitives.len(),
        trace.graph.len(),
        trace.graph.pending_arrows()
    );

    Ok(trace)
}

/// Read and parse a trace file
pub fn parse_trace_file(path: impl AsRef<Path>) -> Result<ParsedTrace, ParseError> {
    let path = path.as_ref();
    debug!("Reading trace from: {}", path.display());
    let input = std::fs::read_to_string(path)?;
    parse_trace(&input)
}

/// Dispatch one line of the trace
///
/// **Private** - internal helper for parse_trace
fn process_line(trace: &mut ParsedTrace, line: &str, line_number: usize) -> Result<(), ParseError> {
    if line.starts_with(CATEGORY_LINE_PREFIX) {
        let category = parse_category_line(line, line_number)?;
        trace.categories.insert(category);
        trace.category_lines.push(line.to_string());
    } else if line.starts_with(PRIMITIVE_LINE_PREFIX) {
        let fields = parse_primitive_line(line, line_number, &trace.categories)?;
        let mut primitive = Primitive::with_source_text(
            fields.start_time,
            fields.end_time,
            fields.start_text,
            fields.end_text,
            fields.from_rank,
            fields.to_rank,
            fields.category,
        );
        let (start_node, end_node) = spawn_nodes(&mut trace.graph, fields.kind, &primitive);
        primitive.start_node = Some(start_node);
        primitive.end_node = end_node;
        trace.primitives.push(primitive);
    }
    Ok(())
}

/// Parse a `Category` definition line
///
/// The label is the text between `name=` and the `topo` token.
pub fn parse_category_line(line: &str, line_number: usize) -> Result<Category, ParseError> {
    let malformed = |reason: &str| ParseError::Malformed {
        line_number,
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let after_index = line
        .split_once("index=")
        .map(|(_, rest)| rest)
        .ok_or_else(|| malformed("missing index="))?;
    let id_text = after_index
        .split_once("name")
        .map(|(id, _)| id)
        .ok_or_else(|| malformed("missing name="))?;
    let id = id_text
        .trim()
        .parse::<u32>()
        .map_err(|e| malformed(&format!("invalid category index '{}': {}", id_text.trim(), e)))?;

    let after_name = line
        .split_once("name=")
        .map(|(_, rest)| rest)
        .ok_or_else(|| malformed("missing name="))?;
    let name = after_name
        .split_once("topo")
        .map_or(after_name, |(name, _)| name)
        .trim();

    Ok(Category::new(id, name))
}

/// Parse a `Primitive[...]` line
///
/// Message primitives may be logged with start and end transposed;
/// the embedded `(start, from) (end, to)` pairs reveal this and the
/// primary times are swapped back.
pub fn parse_primitive_line(
    line: &str,
    line_number: usize,
    categories: &CategoryMap,
) -> Result<PrimitiveFields, ParseError> {
    let malformed = |reason: String| ParseError::Malformed {
        line_number,
        line: line.to_string(),
        reason,
    };

    if !line.trim_end().ends_with(']') {
        return Err(malformed("unterminated primitive (missing ']')".to_string()));
    }

    let bbox = line
        .split_once("TimeBBox(")
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(inner, _)| inner)
        .ok_or_else(|| malformed("missing TimeBBox(...)".to_string()))?;
    let (start_raw, end_raw) = bbox
        .split_once(',')
        .ok_or_else(|| malformed("TimeBBox needs two times".to_string()))?;
    let mut start_text = start_raw.trim().to_string();
    let mut end_text = end_raw.trim().to_string();
    let mut start_time = parse_time(&start_text).map_err(&malformed)?;
    let mut end_time = parse_time(&end_text).map_err(&malformed)?;

    let after_category = line
        .split_once("Category=")
        .map(|(_, rest)| rest)
        .ok_or_else(|| malformed("missing Category=".to_string()))?;
    let (category_text, pairs_text) = after_category
        .split_once(char::is_whitespace)
        .unwrap_or((after_category, ""));
    let category = category_text
        .trim()
        .parse::<u32>()
        .map_err(|e| malformed(format!("invalid category id '{}': {}", category_text, e)))?;

    let kind = categories
        .kind_of(category)
        .ok_or_else(|| ParseError::UnknownCategory {
            id: category,
            line_number,
            line: line.to_string(),
        })?;

    let pairs = extract_pairs(pairs_text);
    let (_, from_text) = pairs
        .first()
        .ok_or_else(|| malformed("missing (time, rank) pair".to_string()))?;
    let from_rank = parse_rank(from_text).map_err(&malformed)?;

    let to_rank = if start_time == end_time {
        from_rank
    } else {
        let (_, to_text) = pairs
            .get(1)
            .ok_or_else(|| malformed("missing second (time, rank) pair".to_string()))?;
        parse_rank(to_text).map_err(&malformed)?
    };

    if kind == CategoryKind::Message && pairs.len() >= 2 {
        let check_start = parse_time(pairs[0].0).map_err(&malformed)?;
        let check_end = parse_time(pairs[1].0).map_err(&malformed)?;
        if check_start > check_end {
            debug!("Line {}: message logged end-first, swapping times", line_number);
            std::mem::swap(&mut start_time, &mut end_time);
            std::mem::swap(&mut start_text, &mut end_text);
        }
    }

    Ok(PrimitiveFields {
        category,
        kind,
        start_time,
        end_time,
        start_text,
        end_text,
        from_rank,
        to_rank,
    })
}

/// Collect every `(a, b)` group in order
///
/// **Private** - internal utility
fn extract_pairs(text: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut rest = text;
    while let Some((_, after_open)) = rest.split_once('(') {
        let Some((inner, after_close)) = after_open.split_once(')') else {
            break;
        };
        if let Some((a, b)) = inner.split_once(',') {
            pairs.push((a.trim(), b.trim()));
        }
        rest = after_close;
    }
    pairs
}

fn parse_time(text: &str) -> Result<f64, String> {
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid time '{}': {}", text.trim(), e))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("non-finite time '{}'", text.trim()))
    }
}

fn parse_rank(text: &str) -> Result<Rank, String> {
    text.trim()
        .parse::<Rank>()
        .map_err(|e| format!("invalid rank '{}': {}", text.trim(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> CategoryMap {
        let mut map = CategoryMap::new();
        map.insert(Category::new(0, "MPI_Send"));
        map.insert(Category::new(1, "message"));
        map
    }

    #[test]
    fn test_parse_category_line() {
        let category =
            parse_category_line("Category[ index=4 name=MPI_Recv topo=State color=(255,0,0) ]", 1)
                .unwrap();
        assert_eq!(category.id, 4);
        assert_eq!(category.name, "MPI_Recv");
        assert_eq!(category.kind, CategoryKind::Receive);
    }

    #[test]
    fn test_parse_category_line_bad_index() {
        let result = parse_category_line("Category[ index=x name=MPI_Recv topo=State ]", 9);
        assert!(matches!(result, Err(ParseError::Malformed { line_number: 9, .. })));
    }

    #[test]
    fn test_parse_send_primitive() {
        let fields = parse_primitive_line(
            "Primitive[ TimeBBox(0.5,1.25) Category=0 (0.5, 2) (1.25, 3) ]",
            1,
            &categories(),
        )
        .unwrap();

        assert_eq!(fields.kind, CategoryKind::Send);
        assert_eq!(fields.start_time, 0.5);
        assert_eq!(fields.end_time, 1.25);
        assert_eq!(fields.from_rank, 2);
        assert_eq!(fields.to_rank, 3);
    }

    #[test]
    fn test_zero_length_primitive_uses_from_rank() {
        let fields = parse_primitive_line(
            "Primitive[ TimeBBox(2.0,2.0) Category=0 (2.0, 5) ]",
            1,
            &categories(),
        )
        .unwrap();
        assert_eq!(fields.to_rank, 5);
    }

    #[test]
    fn test_reversed_message_is_swapped() {
        let fields = parse_primitive_line(
            "Primitive[ TimeBBox(3.0,1.0) Category=1 (3.0, 0) (1.0, 1) ]",
            1,
            &categories(),
        )
        .unwrap();

        assert!(fields.start_time < fields.end_time);
        assert_eq!(fields.start_text, "1.0");
        assert_eq!(fields.end_text, "3.0");
    }

    #[test]
    fn test_reversed_send_is_not_swapped() {
        let fields = parse_primitive_line(
            "Primitive[ TimeBBox(3.0,1.0) Category=0 (3.0, 0) (1.0, 1) ]",
            1,
            &categories(),
        )
        .unwrap();
        assert_eq!(fields.start_time, 3.0);
    }

    #[test]
    fn test_unknown_category_is_fatal() {
        let result = parse_primitive_line(
            "Primitive[ TimeBBox(0.0,1.0) Category=42 (0.0, 0) (1.0, 0) ]",
            7,
            &categories(),
        );
        assert!(matches!(
            result,
            Err(ParseError::UnknownCategory { id: 42, line_number: 7, .. })
        ));
    }

    #[test]
    fn test_unterminated_primitive_is_fatal() {
        let result = parse_primitive_line(
            "Primitive[ TimeBBox(0.0,1.0) Category=0 (0.0, 0) (1.0, 0)",
            3,
            &categories(),
        );
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_bad_number_is_fatal() {
        let result = parse_primitive_line(
            "Primitive[ TimeBBox(abc,1.0) Category=0 (0.0, 0) (1.0, 0) ]",
            3,
            &categories(),
        );
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_extract_pairs() {
        let pairs = extract_pairs(" (0.1, 0) (0.2, 1) ]");
        assert_eq!(pairs, vec![("0.1", "0"), ("0.2", "1")]);
    }

    #[test]
    fn test_other_lines_are_ignored() {
        let trace = parse_trace("SLOG-2 header\nCategory[ index=0 name=MPI_Send topo=State ]\n\nsomething else\n")
            .unwrap();
        assert_eq!(trace.category_lines.len(), 1);
        assert!(trace.primitives.is_empty());
    }
}
