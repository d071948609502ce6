use std::collections::HashMap;

use crate::messages::{SpeakerSnapshot, SpeakerSummaryEntry};

/// Presentation colors assigned to speakers, round-robin. Eight entries;
/// sessions with more than eight speakers reuse colors.
pub const SPEAKER_PALETTE: [&str; 8] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6", "#bcf60c",
];

/// Per-speaker aggregate state for one session.
#[derive(Debug, Clone)]
pub struct SpeakerSegment {
    pub color: &'static str,
    pub duration_secs: f64,
    pub word_count: u64,
}

/// Session-owned registry of every speaker identity seen so far.
///
/// Identities keep their first-assigned color for the life of the session,
/// and iteration order is first-seen order (the summary and the per-event
/// snapshots depend on it). Entries are never removed.
pub struct SpeakerRegistry {
    order: Vec<String>,
    segments: HashMap<String, SpeakerSegment>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            segments: HashMap::new(),
        }
    }

    /// Returns the speaker's color, assigning the next palette entry on
    /// first sight.
    pub fn color_for(&mut self, speaker: &str) -> &'static str {
        self.segment_for(speaker).color
    }

    /// Looks up the speaker's segment, creating it (and assigning a color)
    /// if absent.
    pub fn segment_for(&mut self, speaker: &str) -> &mut SpeakerSegment {
        if !self.segments.contains_key(speaker) {
            let color = SPEAKER_PALETTE[self.order.len() % SPEAKER_PALETTE.len()];
            self.order.push(speaker.to_string());
            self.segments.insert(
                speaker.to_string(),
                SpeakerSegment {
                    color,
                    duration_secs: 0.0,
                    word_count: 0,
                },
            );
        }
        self.segments.get_mut(speaker).expect("segment just inserted")
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn speaker_count(&self) -> usize {
        self.order.len()
    }

    /// Color + cumulative duration for every speaker, first-seen order.
    /// Sent with each transcript message; grows monotonically.
    pub fn snapshot(&self) -> Vec<SpeakerSnapshot> {
        self.order
            .iter()
            .map(|speaker| {
                let segment = &self.segments[speaker];
                SpeakerSnapshot {
                    speaker: speaker.clone(),
                    color: segment.color.to_string(),
                    duration: segment.duration_secs,
                }
            })
            .collect()
    }

    /// Final per-speaker totals, first-seen order, each identity exactly once.
    pub fn summary(&self) -> Vec<SpeakerSummaryEntry> {
        self.order
            .iter()
            .map(|speaker| {
                let segment = &self.segments[speaker];
                SpeakerSummaryEntry {
                    speaker: speaker.clone(),
                    color: segment.color.to_string(),
                    duration: segment.duration_secs,
                    word_count: segment.word_count,
                }
            })
            .collect()
    }
}

impl Default for SpeakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
