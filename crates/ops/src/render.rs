//! Human and JSON renderings of selections.

use std::io::{self, Write};

use kglue_core::{Details, MatchSet, ResourceRecord};
use serde_json::Value;

fn write_json(out: &mut dyn Write, value: &impl serde::Serialize) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// Record objects with their 1-based position added as `index`.
pub fn numbered_json(set: &MatchSet) -> io::Result<Vec<Value>> {
    set.numbered()
        .map(|(i, r)| -> io::Result<Value> {
            let mut v = serde_json::to_value(r)?;
            if let Some(obj) = v.as_object_mut() {
                obj.insert("index".to_string(), Value::from(i));
            }
            Ok(v)
        })
        .collect()
}

/// `[ 7] namespace:name` per record, or a JSON array.
pub fn listing(out: &mut dyn Write, set: &MatchSet, json: bool) -> io::Result<()> {
    if json {
        return write_json(out, &numbered_json(set)?);
    }
    for (i, r) in set.numbered() {
        writeln!(out, "[{:>2}] {}", i, r.key())?;
    }
    Ok(())
}

pub fn single(out: &mut dyn Write, record: &ResourceRecord, json: bool) -> io::Result<()> {
    if json {
        return write_json(out, record);
    }
    writeln!(out, "{}", record.identifier())
}

pub fn containers(out: &mut dyn Write, record: &ResourceRecord, json: bool) -> io::Result<()> {
    if json {
        return write_json(out, &record.containers);
    }
    for c in record.containers.iter() {
        writeln!(out, "{}", c)?;
    }
    Ok(())
}

pub fn describe(out: &mut dyn Write, record: &ResourceRecord, json: bool) -> io::Result<()> {
    if json {
        return write_json(out, record);
    }
    let mut rows: Vec<(&str, String)> = vec![
        ("namespace", record.namespace.clone()),
        ("name", record.name.clone()),
        ("kind", record.kind().to_string()),
    ];
    match &record.details {
        Details::Pod(p) => {
            rows.push(("ready", p.ready.clone()));
            rows.push(("status", p.status.clone()));
            rows.push(("restarts", p.restarts.to_string()));
            rows.push(("age", p.age.clone()));
            if let Some(owner) = &p.owner {
                rows.push(("deployment", owner.clone()));
            }
        }
        Details::Deployment(d) => {
            rows.push(("ready", d.ready.clone()));
            rows.push(("up-to-date", d.up_to_date.to_string()));
            rows.push(("available", d.available.to_string()));
            rows.push(("age", d.age.clone()));
            if !d.images.is_empty() {
                rows.push(("images", d.images.join(", ")));
            }
            if let Some(sel) = &d.selector {
                rows.push(("selector", sel.clone()));
            }
        }
    }
    rows.push(("containers", record.containers.join(", ")));
    for (label, value) in rows {
        writeln!(out, "{:<12}{}", format!("{}:", label), value)?;
    }
    Ok(())
}
