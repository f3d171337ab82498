use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use textbook_chunker::PipelineOutput;

pub const CHUNKS_FILE: &str = "chunks.jsonl";
pub const TOC_FILE: &str = "toc.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Write stdout, treating a closed pipe (`| head`) as success
pub fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    print_stdout(&serde_json::to_string_pretty(value)?)
}

/// Write `chunks.jsonl`, `toc.json` and `manifest.json` under `dir`
pub fn write_outputs(dir: &Path, output: &PipelineOutput) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir {}", dir.display()))?;

    let chunks_path = dir.join(CHUNKS_FILE);
    let file = File::create(&chunks_path)
        .with_context(|| format!("Failed to create {}", chunks_path.display()))?;
    let mut writer = BufWriter::new(file);
    for record in &output.records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", chunks_path.display()))?;

    write_pretty(&dir.join(TOC_FILE), &output.toc)?;
    write_pretty(&dir.join(MANIFEST_FILE), &output.manifest)?;
    Ok(())
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
