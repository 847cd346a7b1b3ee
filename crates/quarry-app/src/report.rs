//! Human-readable import summaries.

use std::io::{self, Write};

use quarry_import::ImportResult;
use quarry_voxel::BlockRegistry;

/// Writes what an import produced: chunk counts, skipped coordinates, block
/// types and the selection bounds.
pub fn write_summary<W: Write>(out: &mut W, result: &ImportResult) -> io::Result<()> {
    writeln!(out, "Imported {}", result.source_path().display())?;
    writeln!(
        out,
        "  chunks:      {} of {}",
        result.chunks().len(),
        result.enumerated()
    )?;
    if !result.skipped().is_empty() {
        let skipped: Vec<String> = result.skipped().iter().map(ToString::to_string).collect();
        writeln!(out, "  skipped:     {}", skipped.join(", "))?;
    }
    writeln!(out, "  block types: {}", result.registry().len())?;
    match result.selection().bounds() {
        Some(bounds) => writeln!(
            out,
            "  selection:   {:?} .. {:?} ({} blocks)",
            bounds.min,
            bounds.max,
            result.selection().volume()
        ),
        None => writeln!(out, "  selection:   empty"),
    }
}

/// Writes every block type in `registry`, sorted by its canonical text.
pub fn write_block_list<W: Write>(out: &mut W, registry: &BlockRegistry) -> io::Result<()> {
    let mut blocks: Vec<(u32, String)> = registry
        .iter()
        .map(|(id, block)| (id.0, block.to_string()))
        .collect();
    blocks.sort_by(|a, b| a.1.cmp(&b.1));
    for (id, text) in blocks {
        writeln!(out, "  {id:>5}  {text}")?;
    }
    Ok(())
}
