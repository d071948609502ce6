use crate::backend::{ItemKind, TranscriptEvent};
use crate::messages::{EnrichedItem, ServerMessage, SpeakerSummaryEntry};
use crate::speakers::SpeakerRegistry;

/// Turns backend transcript events into enriched client messages.
///
/// Owns the speaker registry and the "current speaker" carried between
/// events. Mutated only by the session's transcript-consumption loop, in
/// backend-delivery order. Partial events pass through as-received; the
/// client supersedes earlier partials with the latest per utterance.
pub struct TranscriptProcessor {
    registry: SpeakerRegistry,
    current_speaker: Option<String>,
}

impl TranscriptProcessor {
    pub fn new() -> Self {
        Self {
            registry: SpeakerRegistry::new(),
            current_speaker: None,
        }
    }

    /// Enriches one event. Returns `None` for events with no alternatives.
    pub fn process(&mut self, event: TranscriptEvent) -> Option<ServerMessage> {
        if let Some(speaker) = &event.speaker {
            self.current_speaker = Some(speaker.clone());
            self.registry.segment_for(speaker);
        }

        let alternative = event.alternatives.into_iter().next()?;

        let mut items = Vec::with_capacity(alternative.items.len());
        for item in alternative.items {
            // Item speaker wins over the event's current speaker.
            let speaker = item
                .speaker
                .clone()
                .or_else(|| self.current_speaker.clone());
            let color = speaker
                .as_deref()
                .map(|s| self.registry.color_for(s).to_string());

            if let Some(speaker) = &speaker {
                let segment = self.registry.segment_for(speaker);
                segment.duration_secs += (item.end_time - item.start_time).max(0.0);
                if item.kind == ItemKind::Pronunciation {
                    segment.word_count += 1;
                }
            }

            items.push(EnrichedItem {
                content: item.content,
                kind: item.kind,
                start_time: item.start_time,
                end_time: item.end_time,
                speaker,
                color,
            });
        }

        let speaker = self.current_speaker.clone();
        let speaker_color = speaker
            .as_deref()
            .map(|s| self.registry.color_for(s).to_string());

        Some(ServerMessage::Transcript {
            text: alternative.transcript,
            is_partial: event.is_partial,
            speaker,
            speaker_color,
            items,
            speaker_segments: self.registry.snapshot(),
        })
    }

    pub fn has_speakers(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn summary(&self) -> Vec<SpeakerSummaryEntry> {
        self.registry.summary()
    }
}

impl Default for TranscriptProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{TranscriptAlternative, TranscriptItem};
    use crate::speakers::SPEAKER_PALETTE;

    fn item(content: &str, kind: ItemKind, start: f64, end: f64, speaker: Option<&str>) -> TranscriptItem {
        TranscriptItem {
            content: content.to_string(),
            kind,
            start_time: start,
            end_time: end,
            speaker: speaker.map(str::to_string),
        }
    }

    fn event(speaker: Option<&str>, is_partial: bool, items: Vec<TranscriptItem>) -> TranscriptEvent {
        let transcript = items
            .iter()
            .map(|i| i.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        TranscriptEvent {
            alternatives: vec![TranscriptAlternative { transcript, items }],
            is_partial,
            speaker: speaker.map(str::to_string),
        }
    }

    #[test]
    fn event_speaker_becomes_current_and_gets_first_color() {
        let mut processor = TranscriptProcessor::new();
        let msg = processor
            .process(event(
                Some("spk_0"),
                true,
                vec![item("hello", ItemKind::Pronunciation, 0.0, 0.5, None)],
            ))
            .unwrap();

        let ServerMessage::Transcript { speaker, speaker_color, items, .. } = msg else {
            panic!("expected transcript");
        };
        assert_eq!(speaker.as_deref(), Some("spk_0"));
        assert_eq!(speaker_color.as_deref(), Some(SPEAKER_PALETTE[0]));
        // Item without its own speaker inherits the current one.
        assert_eq!(items[0].speaker.as_deref(), Some("spk_0"));
        assert_eq!(items[0].color.as_deref(), Some(SPEAKER_PALETTE[0]));
    }

    #[test]
    fn item_speaker_overrides_current_speaker() {
        let mut processor = TranscriptProcessor::new();
        let msg = processor
            .process(event(
                Some("spk_0"),
                false,
                vec![
                    item("one", ItemKind::Pronunciation, 0.0, 0.4, None),
                    item("two", ItemKind::Pronunciation, 0.4, 0.9, Some("spk_1")),
                ],
            ))
            .unwrap();

        let ServerMessage::Transcript { items, speaker_segments, .. } = msg else {
            panic!("expected transcript");
        };
        assert_eq!(items[1].speaker.as_deref(), Some("spk_1"));
        assert_eq!(items[1].color.as_deref(), Some(SPEAKER_PALETTE[1]));
        assert_eq!(speaker_segments.len(), 2);
        assert_eq!(speaker_segments[0].speaker, "spk_0");
    }

    #[test]
    fn punctuation_carries_no_word_count() {
        let mut processor = TranscriptProcessor::new();
        processor.process(event(
            Some("spk_0"),
            false,
            vec![
                item("hi", ItemKind::Pronunciation, 0.0, 0.3, None),
                item("there", ItemKind::Pronunciation, 0.3, 0.6, None),
                item(".", ItemKind::Punctuation, 0.6, 0.6, None),
            ],
        ));

        let summary = processor.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].word_count, 2);
        assert!((summary[0].duration - 0.6).abs() < 1e-9);
    }

    #[test]
    fn speakerless_items_get_no_color_and_no_accumulation() {
        let mut processor = TranscriptProcessor::new();
        let msg = processor
            .process(event(
                None,
                true,
                vec![item("word", ItemKind::Pronunciation, 0.0, 0.2, None)],
            ))
            .unwrap();

        let ServerMessage::Transcript { speaker, items, speaker_segments, .. } = msg else {
            panic!("expected transcript");
        };
        assert!(speaker.is_none());
        assert!(items[0].color.is_none());
        assert!(speaker_segments.is_empty());
        assert!(!processor.has_speakers());
    }

    #[test]
    fn snapshot_grows_monotonically_across_events() {
        let mut processor = TranscriptProcessor::new();
        let first = processor
            .process(event(
                Some("spk_0"),
                true,
                vec![item("a", ItemKind::Pronunciation, 0.0, 1.0, None)],
            ))
            .unwrap();
        let second = processor
            .process(event(
                Some("spk_1"),
                false,
                vec![item("b", ItemKind::Pronunciation, 1.0, 2.5, None)],
            ))
            .unwrap();

        let ServerMessage::Transcript { speaker_segments: first_snap, .. } = first else {
            panic!()
        };
        let ServerMessage::Transcript { speaker_segments: second_snap, .. } = second else {
            panic!()
        };
        assert_eq!(first_snap.len(), 1);
        assert_eq!(second_snap.len(), 2);
        assert!(second_snap[0].duration >= first_snap[0].duration);
    }

    #[test]
    fn event_without_alternatives_is_dropped() {
        let mut processor = TranscriptProcessor::new();
        let empty = TranscriptEvent {
            alternatives: vec![],
            is_partial: true,
            speaker: Some("spk_0".into()),
        };
        assert!(processor.process(empty).is_none());
        // Speaker is still registered for the summary.
        assert!(processor.has_speakers());
    }
}
