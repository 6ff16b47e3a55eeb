//! Line-oriented sensor log parsing.
//!
//! A log file is a `reference <temperature> <humidity>` calibration line
//! followed by sensor blocks. Each block opens with a `<kind> <name>` header
//! and runs until the next header or end of input; every other line is a
//! `<timestamp> <value>` reading for the open block. A block is classified
//! the moment it closes, against the reference values in force at that point.
//!
//! Any malformed line rejects the whole file.

use std::io::BufRead;
use std::path::Path;

use grader_core::error::ParseError;
use grader_core::models::{
    GradeReport, Reading, ReferenceValues, SensorKind, SensorRecord, REFERENCE_KEYWORD,
};
use tracing::{debug, warn};

/// Fields on a reading line: timestamp token and value.
const READING_LINE_FIELDS: usize = 2;

// ── Public API ────────────────────────────────────────────────────────────────

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    /// Reference values from the last reference line seen.
    pub reference: ReferenceValues,
    /// Sealed sensor blocks in file order, duplicates included.
    pub sensors: Vec<SensorRecord>,
}

impl ParsedLog {
    /// Collapse the blocks into a name → branding report. When a sensor name
    /// appears in several blocks the last block wins.
    pub fn report(&self) -> GradeReport {
        self.sensors.iter().collect()
    }
}

/// Parse an in-memory sequence of lines.
pub fn parse_lines<I, S>(lines: I) -> Result<ParsedLog, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = LogParser::new();
    for line in lines {
        parser.feed(line.as_ref())?;
    }
    Ok(parser.finish())
}

/// Parse everything readable from `reader`.
///
/// A read failure mid-stream surfaces as [`ParseError::Io`].
pub fn parse_reader<R: BufRead>(reader: R) -> Result<ParsedLog, ParseError> {
    let mut parser = LogParser::new();
    for line in reader.lines() {
        parser.feed(&line?)?;
    }
    Ok(parser.finish())
}

/// Open and parse the log file at `path`.
pub fn parse_file(path: &Path) -> Result<ParsedLog, ParseError> {
    let file = std::fs::File::open(path).map_err(|source| ParseError::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_reader(std::io::BufReader::new(file))?;
    debug!(
        "Parsed {}: {} sensor block(s)",
        path.display(),
        parsed.sensors.len()
    );
    Ok(parsed)
}

// ── LogParser ─────────────────────────────────────────────────────────────────

/// A sensor block whose readings are still being collected.
#[derive(Debug)]
struct OpenBlock {
    kind: SensorKind,
    name: String,
    readings: Vec<Reading>,
}

impl OpenBlock {
    fn seal(self, reference: &ReferenceValues) -> SensorRecord {
        let mut record = SensorRecord {
            kind: self.kind,
            name: self.name,
            readings: self.readings,
            branding: self.kind.default_branding(),
        };
        record.branding = record.kind.classify(reference, &record.values());
        debug!(
            sensor = %record.name,
            kind = %record.kind,
            readings = record.readings.len(),
            branding = %record.branding,
            "sensor block closed"
        );
        record
    }
}

/// Incremental parser; feed it lines in order, then call [`LogParser::finish`].
#[derive(Debug, Default)]
pub struct LogParser {
    reference: ReferenceValues,
    open: Option<OpenBlock>,
    sealed: Vec<SensorRecord>,
    line_no: usize,
}

impl LogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line. The line's first whitespace-separated token decides
    /// whether it is a reference line, a sensor header or a reading.
    pub fn feed(&mut self, line: &str) -> Result<(), ParseError> {
        self.line_no += 1;
        let fields: Vec<&str> = line.split_whitespace().collect();

        match fields.first().copied() {
            Some(REFERENCE_KEYWORD) => self.reference_line(&fields[1..]),
            Some(keyword) => match SensorKind::from_keyword(keyword) {
                Some(kind) => self.header_line(kind, &fields[1..]),
                None => self.reading_line(&fields),
            },
            None => self.reading_line(&fields),
        }
    }

    /// Close the open block, if any, and return everything parsed.
    pub fn finish(mut self) -> ParsedLog {
        self.close_block();
        ParsedLog {
            reference: self.reference,
            sensors: self.sealed,
        }
    }

    fn reference_line(&mut self, values: &[&str]) -> Result<(), ParseError> {
        let line = self.line_no;
        if values.len() != ReferenceValues::FIELD_COUNT {
            return Err(ParseError::WrongNumberRefFields { line });
        }
        let temperature = values[0]
            .parse::<f64>()
            .map_err(|source| ParseError::TempNotFloat { line, source })?;
        let humidity = values[1]
            .parse::<f64>()
            .map_err(|source| ParseError::HumidityNotFloat { line, source })?;

        self.reference = ReferenceValues::new(temperature, humidity);
        debug!(temperature, humidity, "reference values");
        Ok(())
    }

    fn header_line(&mut self, kind: SensorKind, rest: &[&str]) -> Result<(), ParseError> {
        let name = rest.first().ok_or(ParseError::MissingSensorName {
            line: self.line_no,
        })?;
        self.close_block();
        self.open = Some(OpenBlock {
            kind,
            name: (*name).to_string(),
            readings: Vec::new(),
        });
        Ok(())
    }

    fn reading_line(&mut self, fields: &[&str]) -> Result<(), ParseError> {
        let line = self.line_no;
        if fields.len() != READING_LINE_FIELDS {
            return Err(ParseError::WrongNumberReadingFields { line });
        }
        let value = fields[1]
            .parse::<f64>()
            .map_err(|source| ParseError::ReadingNotFloat { line, source })?;

        match self.open.as_mut() {
            Some(block) => block.readings.push(Reading::new(fields[0], value)),
            None => warn!(line, "reading before any sensor header; ignored"),
        }
        Ok(())
    }

    fn close_block(&mut self) {
        if let Some(block) = self.open.take() {
            let record = block.seal(&self.reference);
            self.sealed.push(record);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use grader_core::models::Branding;
    use std::io::Write;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn parse(text: &str) -> Result<ParsedLog, ParseError> {
        parse_lines(text.lines())
    }

    fn write_log(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", text).unwrap();
        path
    }

    const TEMP_ULTRA_PRECISE: &str = "reference 100 0
thermometer temp-1
2007-04-05T22:00 100
2007-04-05T22:01 100.1
2007-04-05T22:02 99.9";

    const MIXED: &str = "reference 70.0 45.0
thermometer temp-1
2007-04-05T22:00 72.4
2007-04-05T22:01 76.0
2007-04-05T22:02 79.1
2007-04-05T22:03 75.6
2007-04-05T22:04 71.2
thermometer temp-2
2007-04-05T22:01 69.5
2007-04-05T22:02 70.1
2007-04-05T22:03 71.3
2007-04-05T22:04 71.5
2007-04-05T22:05 69.8
humidity hum-1
2007-04-05T22:04 45.2
2007-04-05T22:05 45.3
2007-04-05T22:06 45.1
humidity hum-2
2007-04-05T22:04 44.4
2007-04-05T22:05 43.9
2007-04-05T22:06 44.9
2007-04-05T22:07 43.8
2007-04-05T22:08 42.1";

    // ── reference line ────────────────────────────────────────────────────────

    #[test]
    fn test_reference_only() {
        let parsed = parse("reference 100 0").unwrap();
        assert_eq!(parsed.reference, ReferenceValues::new(100.0, 0.0));
        assert!(parsed.sensors.is_empty());
        assert!(parsed.report().is_empty());
    }

    #[test]
    fn test_reference_without_values() {
        let err = parse("reference").unwrap_err();
        assert!(matches!(err, ParseError::WrongNumberRefFields { line: 1 }));
    }

    #[test]
    fn test_reference_with_one_value() {
        let err = parse("reference 1").unwrap_err();
        assert!(matches!(err, ParseError::WrongNumberRefFields { line: 1 }));
    }

    #[test]
    fn test_reference_with_three_values() {
        let err = parse("reference 1 2 3").unwrap_err();
        assert!(matches!(err, ParseError::WrongNumberRefFields { .. }));
    }

    #[test]
    fn test_reference_temperature_not_float() {
        let err = parse("reference a 2").unwrap_err();
        assert!(matches!(err, ParseError::TempNotFloat { line: 1, .. }));
    }

    #[test]
    fn test_reference_humidity_not_float() {
        let err = parse("reference 2 a").unwrap_err();
        assert!(matches!(err, ParseError::HumidityNotFloat { line: 1, .. }));
    }

    #[test]
    fn test_second_reference_overwrites_first() {
        let text = "reference 10 10
reference 100 45
thermometer temp-1
t0 100
t1 100";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.reference, ReferenceValues::new(100.0, 45.0));
        assert_eq!(parsed.sensors[0].branding, Branding::UltraPrecise);
    }

    // ── sensor blocks ─────────────────────────────────────────────────────────

    #[test]
    fn test_thermometer_block_is_classified() {
        let parsed = parse(TEMP_ULTRA_PRECISE).unwrap();
        assert_eq!(parsed.sensors.len(), 1);
        let record = &parsed.sensors[0];
        assert_eq!(record.kind, SensorKind::Thermometer);
        assert_eq!(record.name, "temp-1");
        assert_eq!(record.readings.len(), 3);
        assert_eq!(record.readings[0].timestamp, "2007-04-05T22:00");
        assert_eq!(record.branding, Branding::UltraPrecise);
    }

    #[test]
    fn test_sealed_record_branding_matches_its_values() {
        let parsed = parse(MIXED).unwrap();
        for record in &parsed.sensors {
            assert_eq!(
                record.branding,
                record.kind.classify(&parsed.reference, &record.values())
            );
        }
    }

    #[test]
    fn test_header_without_readings_keeps_default() {
        let parsed = parse("reference 100 0\nthermometer temp-1").unwrap();
        assert_eq!(parsed.report().get("temp-1"), Some(Branding::Precise));

        let parsed = parse("reference 100 45\nhumidity hum-1").unwrap();
        assert_eq!(parsed.report().get("hum-1"), Some(Branding::Keep));
    }

    #[test]
    fn test_mixed_file() {
        let report = parse(MIXED).unwrap().report();
        assert_eq!(report.len(), 4);
        assert_eq!(report.get("temp-1"), Some(Branding::Precise));
        assert_eq!(report.get("temp-2"), Some(Branding::UltraPrecise));
        assert_eq!(report.get("hum-1"), Some(Branding::Keep));
        assert_eq!(report.get("hum-2"), Some(Branding::Discard));
    }

    #[test]
    fn test_duplicate_sensor_name_later_block_wins() {
        let text = "reference 100 0
thermometer temp-1
t0 100
t1 100
thermometer temp-1
t2 200
t3 0";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.sensors.len(), 2);
        assert_eq!(parsed.sensors[0].branding, Branding::UltraPrecise);
        assert_eq!(parsed.report().get("temp-1"), Some(Branding::Precise));
    }

    #[test]
    fn test_header_without_name() {
        let err = parse("reference 100 0\nhumidity").unwrap_err();
        assert!(matches!(err, ParseError::MissingSensorName { line: 2 }));
    }

    #[test]
    fn test_block_uses_reference_in_force_when_closed() {
        // The block closes at end of input, after the second reference line.
        let text = "reference 0 0
thermometer temp-1
t0 100
t1 100
reference 100 0";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.sensors[0].branding, Branding::UltraPrecise);
    }

    // ── reading lines ─────────────────────────────────────────────────────────

    #[test]
    fn test_reading_with_too_many_fields() {
        let text = "reference 100 0\nthermometer temp-1\n2007-04-05T22:00 100 extra";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, ParseError::WrongNumberReadingFields { line: 3 }));
    }

    #[test]
    fn test_reading_with_one_field() {
        let text = "reference 100 0\nthermometer temp-1\n100";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, ParseError::WrongNumberReadingFields { line: 3 }));
    }

    #[test]
    fn test_reading_not_float() {
        let text = "reference 100 0\nthermometer temp-1\n2007-04-05T22:00 hot";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, ParseError::ReadingNotFloat { line: 3, .. }));
    }

    #[test]
    fn test_blank_line_is_malformed_reading() {
        let text = "reference 100 0\n\nthermometer temp-1";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, ParseError::WrongNumberReadingFields { line: 2 }));
    }

    #[test]
    fn test_valid_reading_before_header_is_ignored() {
        let text = "reference 100 0\nt0 5000\nthermometer temp-1\nt1 100\nt2 100";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.sensors[0].readings.len(), 2);
        assert_eq!(parsed.sensors[0].branding, Branding::UltraPrecise);
    }

    #[test]
    fn test_malformed_reading_before_header_fails() {
        let err = parse("reference 100 0\nt0 oops").unwrap_err();
        assert!(matches!(err, ParseError::ReadingNotFloat { line: 2, .. }));
    }

    #[test]
    fn test_error_after_valid_blocks_yields_nothing() {
        let text = format!("{}\nthermometer temp-2\nbroken", TEMP_ULTRA_PRECISE);
        assert!(parse(&text).is_err());
    }

    #[test]
    fn test_missing_reference_grades_against_zero() {
        let parsed = parse("thermometer temp-1\nt0 0.1\nt1 -0.1").unwrap();
        assert_eq!(parsed.reference, ReferenceValues::default());
        assert_eq!(parsed.sensors[0].branding, Branding::UltraPrecise);
    }

    // ── parse_reader / parse_file ─────────────────────────────────────────────

    #[test]
    fn test_parse_reader_handles_crlf() {
        let text = "reference 100 0\r\nthermometer temp-1\r\nt0 100\r\nt1 100\r\n";
        let parsed = parse_reader(text.as_bytes()).unwrap();
        assert_eq!(parsed.sensors[0].branding, Branding::UltraPrecise);
    }

    #[test]
    fn test_parse_file() {
        let dir = TempDir::new().unwrap();
        let path = write_log(dir.path(), "log-1.txt", MIXED);
        let report = parse_file(&path).unwrap().report();
        assert_eq!(report.len(), 4);
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file(Path::new("/tmp/does-not-exist-grader-test/nofile.txt")).unwrap_err();
        assert!(matches!(err, ParseError::OpenFile { .. }));
        assert!(err.to_string().contains("error opening file"));
    }

    #[test]
    fn test_parse_reader_io_error() {
        struct Failing;
        impl std::io::Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }
        let err = parse_reader(std::io::BufReader::new(Failing)).unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_parse_reader_invalid_utf8_is_io_error() {
        let bytes: &[u8] = b"reference 70 45\nthermometer t\xff\n";
        let err = parse_reader(bytes).unwrap_err();
        assert!(matches!(err, ParseError::Io(ref e) if e.kind() == std::io::ErrorKind::InvalidData));
    }
}
