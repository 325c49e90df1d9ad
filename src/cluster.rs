use std::sync::Arc;

use tracing::instrument;

use crate::{util::edit_distance, ClusterOptions, ProminentSign, TextFrame};

/// Where one word of a frame ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub sign: usize,
    pub distance: usize,
    pub created: bool,
}

/// Groups repeated sightings of the same sign by the edit distance between
/// recognized words.
///
/// Every word is compared against every sign, so each ingestion costs
/// `O(words * signs * word_len^2)`.
#[derive(Debug, Clone, Default)]
pub struct SignClusterer {
    options: ClusterOptions,
    signs: Vec<ProminentSign>,
}

impl SignClusterer {
    pub fn new(options: ClusterOptions) -> Self {
        Self {
            options,
            signs: Vec::new(),
        }
    }

    pub fn signs(&self) -> &[ProminentSign] {
        &self.signs
    }

    pub fn into_signs(self) -> Vec<ProminentSign> {
        self.signs
    }

    /// Adds `frame` to the sign closest to each of its words, creating signs
    /// for words that match nothing within the threshold. Words are handled in
    /// order, so a sign created for one word can absorb a later word of the
    /// same frame.
    #[instrument(level = "trace", skip_all, fields(frame = %frame.name()))]
    pub fn ingest(&mut self, frame: &Arc<TextFrame>) -> Vec<Assignment> {
        frame
            .texts()
            .iter()
            .map(|text| self.assign(&text.word, frame))
            .collect()
    }

    fn assign(&mut self, word: &str, frame: &Arc<TextFrame>) -> Assignment {
        match self.closest(word) {
            Some((sign, distance)) if distance <= self.options.max_edit_distance => {
                self.signs[sign].push(Arc::clone(frame));
                log::trace!(
                    "{word:?} joins sign {:?} at distance {distance}",
                    self.signs[sign].canonical()
                );
                Assignment {
                    sign,
                    distance,
                    created: false,
                }
            }
            _ => {
                self.signs.push(ProminentSign::new(word, Arc::clone(frame)));
                log::debug!("New sign {word:?} from frame {}", frame.name());
                Assignment {
                    sign: self.signs.len() - 1,
                    distance: 0,
                    created: true,
                }
            }
        }
    }

    fn closest(&self, word: &str) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (index, sign) in self.signs.iter().enumerate() {
            let distance = edit_distance(word, sign.canonical());
            if best.map_or(true, |(_, min)| distance < min) {
                best = Some((index, distance));
            }
            if distance == 0 {
                break;
            }
        }
        best
    }
}
