use chrono::NaiveDate;
use scorescribe::quantize::{NoteClass, NoteValue};
use scorescribe::score::{
    MeasureEntry, NotatedFragment, ScoreBuilder, ScoreDocument, ScoreHeader, TieMarker,
    TimeSignature,
};

fn header(beats: u32, beat_type: u32) -> ScoreHeader {
    ScoreHeader {
        title: "Rock & Roll <take 2>".to_string(),
        encoding_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        time_signature: TimeSignature::new(beats, beat_type),
    }
}

fn note(pitch: u8, class: NoteClass, dotted: bool) -> Vec<NotatedFragment> {
    NotatedFragment::chain(0, pitch, &[NoteValue::new(class, dotted)])
}

fn parse(xml: &str) -> roxmltree::Document<'_> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    roxmltree::Document::parse_with_options(xml, options).unwrap()
}

fn durations(measure: roxmltree::Node) -> u64 {
    measure
        .children()
        .filter(|n| n.has_tag_name("note"))
        .filter_map(|n| n.children().find(|c| c.has_tag_name("duration")))
        .filter_map(|d| d.text())
        .map(|t| t.parse::<u64>().unwrap())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measures_fill_then_open_new() {
        let mut builder = ScoreBuilder::new(header(4, 4), 64);
        for pitch in 60..65 {
            builder
                .append(0, &note(pitch, NoteClass::Quarter, false))
                .unwrap();
        }
        let part = builder.document().part(0).unwrap();
        assert_eq!(part.measures.len(), 2);
        assert!(part.measures[0].is_full());
        assert_eq!(part.measures[1].filled(), 16);
        assert_eq!(part.measures[1].number, 2);
    }

    #[test]
    fn test_barline_split_in_three_four() {
        let mut builder = ScoreBuilder::new(header(3, 4), 64);
        builder
            .append(0, &note(67, NoteClass::Whole, false))
            .unwrap();

        let part = builder.document().part(0).unwrap();
        assert_eq!(part.measures.len(), 2);
        assert_eq!(part.measures[0].capacity, 48);
        match (&part.measures[0].entries[0], &part.measures[1].entries[0]) {
            (MeasureEntry::Note(head), MeasureEntry::Note(tail)) => {
                assert_eq!(head.value, NoteValue::new(NoteClass::Half, true));
                assert_eq!(head.tie, Some(TieMarker::Start));
                assert_eq!(tail.value, NoteValue::new(NoteClass::Quarter, false));
                assert_eq!(tail.tie, Some(TieMarker::Stop));
            }
            other => panic!("expected two tied notes, got {:?}", other),
        }
    }

    #[test]
    fn test_each_append_publishes_once() {
        let mut builder = ScoreBuilder::new(header(4, 4), 64);
        let handle = builder.handle();
        let chain = NotatedFragment::chain(
            0,
            60,
            &[
                NoteValue::new(NoteClass::Whole, false),
                NoteValue::new(NoteClass::Whole, false),
                NoteValue::new(NoteClass::Quarter, false),
            ],
        );
        builder.append(0, &chain).unwrap();

        let snapshot = handle.current_document();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.measure_count(), 3);
        assert_eq!(snapshot.note_count(), 3);
    }

    #[test]
    fn test_freeze_pads_and_aligns_parts() {
        let mut builder = ScoreBuilder::new(header(4, 4), 64);
        builder
            .append(0, &note(60, NoteClass::Whole, false))
            .unwrap();
        builder
            .append(0, &note(62, NoteClass::Quarter, false))
            .unwrap();
        builder
            .append(
                1,
                &NotatedFragment::chain(1, 40, &[NoteValue::new(NoteClass::Eighth, false)]),
            )
            .unwrap();
        builder.freeze().unwrap();

        let document = builder.document();
        assert!(document.frozen);
        for part in &document.parts {
            assert_eq!(part.measures.len(), 2, "part {}", part.id());
            assert!(part.measures.iter().all(|m| m.is_full()));
        }
        let bass = document.part(1).unwrap();
        assert_eq!(
            bass.measures[1].entries,
            vec![MeasureEntry::Rest(NoteValue::new(NoteClass::Whole, false))]
        );
    }

    #[test]
    fn test_frozen_document_is_valid_musicxml() {
        let mut builder = ScoreBuilder::new(header(4, 4), 64);
        builder
            .append(
                0,
                &NotatedFragment::chain(
                    0,
                    61,
                    &[
                        NoteValue::new(NoteClass::Half, true),
                        NoteValue::new(NoteClass::Eighth, true),
                    ],
                ),
            )
            .unwrap();
        builder
            .append(
                1,
                &NotatedFragment::chain(1, 36, &[NoteValue::new(NoteClass::Half, false)]),
            )
            .unwrap();
        builder.freeze().unwrap();

        let xml = builder.handle().serialize();
        let doc = parse(&xml);
        let root = doc.root_element();
        assert!(root.has_tag_name("score-partwise"));
        assert_eq!(root.attribute("version"), Some("3.1"));

        let title = doc
            .descendants()
            .find(|n| n.has_tag_name("work-title"))
            .and_then(|n| n.text());
        assert_eq!(title, Some("Rock & Roll <take 2>"));

        let ids: Vec<&str> = doc
            .descendants()
            .filter(|n| n.has_tag_name("score-part"))
            .filter_map(|n| n.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["P1", "P2"]);

        for part in root.children().filter(|n| n.has_tag_name("part")) {
            for measure in part.children().filter(|n| n.has_tag_name("measure")) {
                assert_eq!(durations(measure), 64);
            }
        }

        let ties: Vec<&str> = doc
            .descendants()
            .filter(|n| n.has_tag_name("tied"))
            .filter_map(|n| n.attribute("type"))
            .collect();
        assert_eq!(ties, vec!["start", "stop"]);

        let alters = doc
            .descendants()
            .filter(|n| n.has_tag_name("alter"))
            .count();
        assert_eq!(alters, 2);

        let clefs: Vec<&str> = doc
            .descendants()
            .filter(|n| n.has_tag_name("sign"))
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(clefs, vec!["G", "F"]);
    }

    #[test]
    fn test_empty_document_serializes() {
        let document = ScoreDocument::new(header(4, 4));
        let xml = document.serialize();
        let doc = parse(&xml);

        let parts: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("part"))
            .collect();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].attribute("id"), Some("P1"));

        let rest = doc
            .descendants()
            .find(|n| n.has_tag_name("rest"))
            .unwrap();
        assert_eq!(rest.attribute("measure"), Some("yes"));
        let divisions = doc
            .descendants()
            .find(|n| n.has_tag_name("divisions"))
            .and_then(|n| n.text());
        assert_eq!(divisions, Some("16"));
    }

    #[test]
    fn test_clear_keeps_revision_increasing() {
        let mut builder = ScoreBuilder::new(header(4, 4), 64);
        builder
            .append(0, &note(60, NoteClass::Quarter, false))
            .unwrap();
        builder.clear(header(4, 4));

        let snapshot = builder.handle().current_document();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.revision, 2);
    }
}
