//! Terminal diagnostics: one line per failure, or one JSON object under `--json`.

use std::io::{self, Write};

use kglue_core::GlueError;
use kglue_ops::render;
use serde_json::json;

/// Write `err` to `w` (stderr in the binary). An ambiguous selection also lists its matches
/// so the operator can retry with an index; `quiet` drops that listing.
pub fn report(w: &mut dyn Write, err: &GlueError, json: bool, quiet: bool) -> io::Result<()> {
    if json {
        let mut obj = json!({
            "error": err.tag(),
            "message": err.to_string(),
            "exit_code": err.exit_code(),
        });
        if let GlueError::AmbiguousSelection(set) = err {
            obj["matches"] = serde_json::Value::Array(render::numbered_json(set)?);
        }
        serde_json::to_writer(&mut *w, &obj)?;
        return writeln!(w);
    }
    writeln!(w, "error: {}", err)?;
    match err {
        GlueError::AmbiguousSelection(set) if !quiet => render::listing(w, set, false),
        _ => Ok(()),
    }
}
