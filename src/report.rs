use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};

use tracing::instrument;

use crate::{Error, ProminentSign, Result, TextFrame};

pub const DEFAULT_REPORT_NAME: &str = "ProminentSignMapList.txt";

const SEPARATOR: &str = "----------------------------------------";

/// Final frame log and signs of a finished run. Nothing can be ingested once
/// this exists.
#[derive(Debug, Clone, Default)]
pub struct SignRegistry {
    pub frames: Vec<Arc<TextFrame>>,
    pub signs: Vec<ProminentSign>,
}

impl SignRegistry {
    #[instrument(level = "debug", skip(self))]
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::io(path, source))?;
        let mut writer = BufWriter::new(file);
        write_signs(&mut writer, &self.signs)
            .and_then(|()| writer.flush())
            .map_err(|source| Error::io(path, source))?;
        log::debug!("Wrote {} signs to {}", self.signs.len(), path.display());
        Ok(())
    }
}

/// Writes one block per sign: its canonical word, then every frame that
/// showed it with the frame's first recognition score.
pub fn write_signs<W: Write>(writer: &mut W, signs: &[ProminentSign]) -> std::io::Result<()> {
    for sign in signs {
        writeln!(writer, "Canonical Word: {}", sign.canonical())?;
        writeln!(writer, "Detections:")?;
        for frame in sign.frames() {
            match frame.first_score() {
                Some(score) => {
                    writeln!(writer, "  Frame Name: {}, Score: {score}", frame.name())?
                }
                None => writeln!(writer, "  Frame Name: {}, Score: -", frame.name())?,
            }
        }
        writeln!(writer, "{SEPARATOR}")?;
    }
    Ok(())
}
