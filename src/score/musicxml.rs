// MusicXML partwise writer

use super::{part_id, Measure, MeasureEntry, NotatedFragment, Part, ScoreDocument, TieMarker};
use crate::quantize::NoteValue;

const DIVISIONS_PER_QUARTER: u64 = 16;
const SOFTWARE: &str = concat!("scorescribe ", env!("CARGO_PKG_VERSION"));

/// Step, alter and octave for a MIDI pitch, spelled with sharps (60 = C4).
pub fn pitch_spelling(pitch: u8) -> (&'static str, i8, i8) {
    let (step, alter) = match pitch % 12 {
        0 => ("C", 0),
        1 => ("C", 1),
        2 => ("D", 0),
        3 => ("D", 1),
        4 => ("E", 0),
        5 => ("F", 0),
        6 => ("F", 1),
        7 => ("G", 0),
        8 => ("G", 1),
        9 => ("A", 0),
        10 => ("A", 1),
        _ => ("B", 0),
    };
    let octave = (pitch / 12) as i8 - 1;
    (step, alter, octave)
}

pub fn to_musicxml(document: &ScoreDocument) -> String {
    let mut writer = Writer::new(document);
    writer.write();
    writer.buffer
}

struct Writer<'a> {
    document: &'a ScoreDocument,
    buffer: String,
}

impl<'a> Writer<'a> {
    fn new(document: &'a ScoreDocument) -> Self {
        Self {
            document,
            buffer: String::new(),
        }
    }

    fn write(&mut self) {
        self.buffer
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
        self.buffer.push_str("<!DOCTYPE score-partwise PUBLIC \"-//Recordare//DTD MusicXML 3.1 Partwise//EN\" \"http://www.musicxml.org/dtds/partwise.dtd\">\n");
        self.buffer.push_str("<score-partwise version=\"3.1\">\n");
        self.write_header();

        let measure_count = self.document.measure_count().max(1);
        if self.document.parts.is_empty() {
            self.write_part_list(&[part_id(0)]);
            self.write_part(&Part::new(0), measure_count);
        } else {
            let ids: Vec<String> = self.document.parts.iter().map(Part::id).collect();
            self.write_part_list(&ids);
            for part in &self.document.parts {
                self.write_part(part, measure_count);
            }
        }
        self.buffer.push_str("</score-partwise>\n");
    }

    fn write_header(&mut self) {
        let header = &self.document.header;
        self.buffer.push_str("  <work>\n");
        self.buffer.push_str(&format!(
            "    <work-title>{}</work-title>\n",
            escape(&header.title)
        ));
        self.buffer.push_str("  </work>\n");
        self.buffer.push_str("  <identification>\n");
        self.buffer.push_str("    <encoding>\n");
        self.buffer
            .push_str(&format!("      <software>{}</software>\n", SOFTWARE));
        self.buffer.push_str(&format!(
            "      <encoding-date>{}</encoding-date>\n",
            header.encoding_date.format("%Y-%m-%d")
        ));
        self.buffer.push_str("    </encoding>\n");
        self.buffer.push_str("  </identification>\n");
    }

    fn write_part_list(&mut self, ids: &[String]) {
        self.buffer.push_str("  <part-list>\n");
        for id in ids {
            self.buffer
                .push_str(&format!("    <score-part id=\"{}\">\n", id));
            self.buffer
                .push_str(&format!("      <part-name>{}</part-name>\n", part_name(id)));
            self.buffer.push_str("    </score-part>\n");
        }
        self.buffer.push_str("  </part-list>\n");
    }

    fn write_part(&mut self, part: &Part, measure_count: usize) {
        self.buffer
            .push_str(&format!("  <part id=\"{}\">\n", part.id()));
        for index in 0..measure_count {
            let number = index as u32 + 1;
            self.buffer
                .push_str(&format!("    <measure number=\"{}\">\n", number));
            if index == 0 {
                self.write_attributes(part);
            }
            match part.measures.get(index) {
                Some(measure) if !measure.entries.is_empty() => self.write_entries(measure),
                _ => self.write_measure_rest(),
            }
            self.buffer.push_str("    </measure>\n");
        }
        self.buffer.push_str("  </part>\n");
    }

    fn write_attributes(&mut self, part: &Part) {
        let time = self.document.header.time_signature;
        let (sign, line) = clef_for(part);
        self.buffer.push_str("      <attributes>\n");
        self.buffer.push_str(&format!(
            "        <divisions>{}</divisions>\n",
            DIVISIONS_PER_QUARTER
        ));
        self.buffer
            .push_str("        <key>\n          <fifths>0</fifths>\n        </key>\n");
        self.buffer.push_str("        <time>\n");
        self.buffer
            .push_str(&format!("          <beats>{}</beats>\n", time.beats));
        self.buffer.push_str(&format!(
            "          <beat-type>{}</beat-type>\n",
            time.beat_type
        ));
        self.buffer.push_str("        </time>\n");
        self.buffer.push_str("        <clef>\n");
        self.buffer
            .push_str(&format!("          <sign>{}</sign>\n", sign));
        self.buffer
            .push_str(&format!("          <line>{}</line>\n", line));
        self.buffer.push_str("        </clef>\n");
        self.buffer.push_str("      </attributes>\n");
    }

    fn write_entries(&mut self, measure: &Measure) {
        for entry in &measure.entries {
            match entry {
                MeasureEntry::Note(fragment) => self.write_note(fragment),
                MeasureEntry::Rest(value) => self.write_rest(*value),
            }
        }
    }

    fn write_measure_rest(&mut self) {
        let divisions = self.document.header.time_signature.measure_divisions();
        self.buffer.push_str("      <note>\n");
        self.buffer.push_str("        <rest measure=\"yes\"/>\n");
        self.buffer
            .push_str(&format!("        <duration>{}</duration>\n", divisions));
        self.buffer.push_str("      </note>\n");
    }

    fn write_rest(&mut self, value: NoteValue) {
        self.buffer.push_str("      <note>\n");
        self.buffer.push_str("        <rest/>\n");
        self.buffer.push_str(&format!(
            "        <duration>{}</duration>\n",
            value.divisions()
        ));
        self.write_type(value);
        self.buffer.push_str("      </note>\n");
    }

    fn write_note(&mut self, fragment: &NotatedFragment) {
        let (step, alter, octave) = pitch_spelling(fragment.pitch);
        self.buffer.push_str("      <note>\n");
        self.buffer.push_str("        <pitch>\n");
        self.buffer
            .push_str(&format!("          <step>{}</step>\n", step));
        if alter != 0 {
            self.buffer
                .push_str(&format!("          <alter>{}</alter>\n", alter));
        }
        self.buffer
            .push_str(&format!("          <octave>{}</octave>\n", octave));
        self.buffer.push_str("        </pitch>\n");
        self.buffer.push_str(&format!(
            "        <duration>{}</duration>\n",
            fragment.value.divisions()
        ));

        // <tie> precedes <type>; a continuation both stops and starts.
        let tie_types: &[&str] = match fragment.tie {
            None => &[],
            Some(TieMarker::Start) => &["start"],
            Some(TieMarker::Continue) => &["stop", "start"],
            Some(TieMarker::Stop) => &["stop"],
        };
        for tie_type in tie_types {
            self.buffer
                .push_str(&format!("        <tie type=\"{}\"/>\n", tie_type));
        }
        self.write_type(fragment.value);

        if !tie_types.is_empty() {
            self.buffer.push_str("        <notations>\n");
            for tie_type in tie_types {
                self.buffer
                    .push_str(&format!("          <tied type=\"{}\"/>\n", tie_type));
            }
            self.buffer.push_str("        </notations>\n");
        }
        self.buffer.push_str("      </note>\n");
    }

    fn write_type(&mut self, value: NoteValue) {
        self.buffer
            .push_str(&format!("        <type>{}</type>\n", value.class.type_name()));
        if value.dotted {
            self.buffer.push_str("        <dot/>\n");
        }
    }
}

/// Bass clef when the part sits mostly below middle C.
fn clef_for(part: &Part) -> (&'static str, u8) {
    let (sum, count) = part
        .notes()
        .fold((0u64, 0u64), |(sum, count), fragment| {
            (sum + u64::from(fragment.pitch), count + 1)
        });
    if count > 0 && sum / count < 60 {
        ("F", 4)
    } else {
        ("G", 2)
    }
}

fn part_name(id: &str) -> String {
    match id.strip_prefix('P') {
        Some(number) => format!("Channel {}", number),
        None => id.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_spelling() {
        assert_eq!(pitch_spelling(60), ("C", 0, 4));
        assert_eq!(pitch_spelling(61), ("C", 1, 4));
        assert_eq!(pitch_spelling(69), ("A", 0, 4));
        assert_eq!(pitch_spelling(21), ("A", 0, 0));
        assert_eq!(pitch_spelling(0), ("C", 0, -1));
        assert_eq!(pitch_spelling(127), ("G", 0, 9));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("Tom & Jerry <live>"), "Tom &amp; Jerry &lt;live&gt;");
    }

    #[test]
    fn test_part_name() {
        assert_eq!(part_name("P3"), "Channel 3");
    }
}
