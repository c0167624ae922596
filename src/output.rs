//! Interchange output - the schema boundary to the embedding job.
//!
//! One JSON record per line, tagged `def` or `edge`, ordered by file path
//! then declaration order. The downstream consumer turns each definition's
//! signature, doc comment and snippet into a vector; its internals are out
//! of scope here, only this schema is.

use std::io::Write;

use serde::Serialize;

use crate::definition::Definition;
use crate::edge::StructureEdge;
use crate::graph::CodeGraph;
use crate::Result;

/// One serialized record: a definition or an edge.
#[derive(Debug, Serialize)]
#[serde(tag = "record", rename_all = "lowercase")]
pub enum Record<'a> {
    Def(&'a Definition),
    Edge(&'a StructureEdge),
}

/// All records of a graph in stable order: per file (path-sorted), the
/// definitions in declaration order, then that file's edges.
pub fn records(graph: &CodeGraph) -> impl Iterator<Item = Record<'_>> {
    graph.units().flat_map(|unit| {
        unit.definitions
            .iter()
            .map(Record::Def)
            .chain(unit.edges.iter().map(Record::Edge))
    })
}

/// Write the graph as JSON lines.
pub fn write_jsonl<W: Write>(graph: &CodeGraph, mut writer: W) -> Result<()> {
    for record in records(graph) {
        let line = serde_json::to_string(&record)
            .map_err(|e| crate::Error::Parse(format!("record serialization: {}", e)))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
