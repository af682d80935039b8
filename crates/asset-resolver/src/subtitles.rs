//! Subtitle parsing into timed cues.
//!
//! Supports SubRip (`.srt`), WebVTT (`.vtt`), and Advanced SubStation
//! (`.ass`, `Dialogue:` lines only). Cues with a non-positive duration are
//! dropped; a malformed timing line is an error.

use std::path::Path;

use cutdraft_common::timebase::{parse_decimal_seconds, Micros, MICROS_PER_SECOND};
use cutdraft_project_model::asset::SubtitleCue;

/// Subtitle file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
    Ass,
}

impl SubtitleFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::Vtt),
            "ass" => Some(Self::Ass),
            _ => None,
        }
    }
}

/// A parse failure with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct SubtitleParseError {
    pub line: usize,
    pub message: String,
}

impl SubtitleParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Parse subtitle content in the given format.
pub fn parse_subtitles(
    content: &str,
    format: SubtitleFormat,
) -> Result<Vec<SubtitleCue>, SubtitleParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let cues = match format {
        SubtitleFormat::Srt => parse_blocks(&content, 0)?,
        SubtitleFormat::Vtt => parse_vtt(&content)?,
        SubtitleFormat::Ass => parse_ass(&content)?,
    };

    let total = cues.len();
    let cues: Vec<SubtitleCue> = cues
        .into_iter()
        .filter(|c| c.end_micros > c.start_micros)
        .collect();
    if cues.len() < total {
        tracing::warn!(dropped = total - cues.len(), "Dropped zero-length subtitle cues");
    }
    Ok(cues)
}

/// Shared SRT/VTT block parser: blocks separated by blank lines, each
/// with a `start --> end` timing line followed by text.
fn parse_blocks(content: &str, first_line: usize) -> Result<Vec<SubtitleCue>, SubtitleParseError> {
    let mut cues = vec![];
    let mut block: Vec<(usize, &str)> = vec![];

    let lines = content.lines().enumerate().skip(first_line);
    for (idx, line) in lines.chain(std::iter::once((usize::MAX, ""))) {
        if !line.trim().is_empty() {
            block.push((idx + 1, line));
            continue;
        }
        if block.is_empty() {
            continue;
        }
        if let Some(cue) = parse_block(&block)? {
            cues.push(cue);
        }
        block.clear();
    }
    Ok(cues)
}

fn parse_block(block: &[(usize, &str)]) -> Result<Option<SubtitleCue>, SubtitleParseError> {
    let Some(pos) = block.iter().position(|(_, l)| l.contains("-->")) else {
        // Index-only, NOTE, STYLE, and REGION blocks carry no cue.
        return Ok(None);
    };
    let (line_no, timing) = block[pos];
    let (start, end) = parse_timing_line(timing)
        .ok_or_else(|| SubtitleParseError::new(line_no, format!("invalid timing {timing:?}")))?;

    let text = block[pos + 1..]
        .iter()
        .map(|(_, l)| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(SubtitleCue::new(start, end, text)))
}

fn parse_timing_line(line: &str) -> Option<(Micros, Micros)> {
    let (start, rest) = line.split_once("-->")?;
    // WebVTT cue settings follow the end time.
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start)?, parse_timestamp(end)?))
}

/// Parse `HH:MM:SS,mmm`, `HH:MM:SS.mmm`, `MM:SS.mmm`, or ASS `H:MM:SS.cc`.
pub fn parse_timestamp(raw: &str) -> Option<Micros> {
    let raw = raw.trim().replace(',', ".");
    let parts: Vec<&str> = raw.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, *s),
        [m, s] => (0, m.parse::<u64>().ok()?, *s),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    let seconds = parse_decimal_seconds(seconds)?;
    if seconds >= 60 * MICROS_PER_SECOND {
        return None;
    }
    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60)?
        .checked_mul(MICROS_PER_SECOND)?
        .checked_add(seconds)
}

fn parse_vtt(content: &str) -> Result<Vec<SubtitleCue>, SubtitleParseError> {
    let header = content.lines().next().unwrap_or("");
    if !header.starts_with("WEBVTT") {
        return Err(SubtitleParseError::new(1, "missing WEBVTT header"));
    }
    parse_blocks(content, 1)
}

fn parse_ass(content: &str) -> Result<Vec<SubtitleCue>, SubtitleParseError> {
    let mut in_events = false;
    let mut format: Vec<String> = ["layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut cues = vec![];

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.starts_with('[') {
            in_events = line.eq_ignore_ascii_case("[events]");
            continue;
        }
        if !in_events {
            continue;
        }
        if let Some(rest) = line.strip_prefix("Format:") {
            format = rest
                .split(',')
                .map(|f| f.trim().to_ascii_lowercase())
                .collect();
            continue;
        }
        let Some(rest) = line.strip_prefix("Dialogue:") else {
            continue;
        };

        let fields: Vec<&str> = rest.splitn(format.len(), ',').collect();
        let field = |name: &str| -> Option<&str> {
            let i = format.iter().position(|f| f == name)?;
            fields.get(i).map(|v| v.trim())
        };
        let start = field("start").and_then(parse_timestamp);
        let end = field("end").and_then(parse_timestamp);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(SubtitleParseError::new(line_no, "invalid Dialogue timing"));
        };
        let text = clean_ass_text(field("text").unwrap_or(""));
        if !text.is_empty() {
            cues.push(SubtitleCue::new(start, end, text));
        }
    }

    Ok(cues)
}

/// Strip `{\...}` override blocks and expand `\N` line breaks.
fn clean_ass_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.replace("\\N", "\n").replace("\\n", "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_srt() {
        let srt = "1\r\n00:00:00,000 --> 00:00:02,500\r\nHello world\r\n\r\n2\r\n00:00:03,000 --> 00:00:05,000\r\nThis is\r\na test\r\n";
        let cues = parse_subtitles(srt, SubtitleFormat::Srt).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], SubtitleCue::new(0, 2_500_000, "Hello world"));
        assert_eq!(cues[1].start_micros, 3_000_000);
        assert_eq!(cues[1].text, "This is\na test");
    }

    #[test]
    fn test_srt_bad_timing_reports_line() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nok\n\n2\n00:00:xx,000 --> 00:00:04,000\nbroken\n";
        let err = parse_subtitles(srt, SubtitleFormat::Srt).unwrap_err();
        assert_eq!(err.line, 6);
    }

    #[test]
    fn test_huge_hour_field_is_a_parse_error() {
        assert_eq!(parse_timestamp("99999999999999999:00:00,000"), None);
        assert_eq!(parse_timestamp("5124095577:00:00,000"), None);

        let srt = "1\n99999999999999999:00:00,000 --> 99999999999999999:00:01,000\nboom\n";
        let err = parse_subtitles(srt, SubtitleFormat::Srt).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_parse_vtt_with_settings_and_notes() {
        let vtt = "\u{feff}WEBVTT\n\nNOTE this is ignored\n\nintro\n00:01.500 --> 00:03.000 align:start position:10%\nOne\n\n01:00:00.000 --> 01:00:01.250\nTwo\n";
        let cues = parse_subtitles(vtt, SubtitleFormat::Vtt).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], SubtitleCue::new(1_500_000, 3_000_000, "One"));
        assert_eq!(cues[1].start_micros, 3_600_000_000);
        assert_eq!(cues[1].end_micros, 3_601_250_000);
    }

    #[test]
    fn test_vtt_requires_header() {
        let err = parse_subtitles("00:01.000 --> 00:02.000\nx\n", SubtitleFormat::Vtt).unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_parse_ass_dialogue() {
        let ass = "[Script Info]\nTitle: Test\n\n[V4+ Styles]\nFormat: Name, Fontname\nStyle: Default,Arial\n\n[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\nComment: 0,0:00:00.00,0:00:01.00,Default,,0,0,0,,skip me\nDialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,Hello, world!\nDialogue: 0,0:00:05.50,0:00:08.00,Default,,0,0,0,,{\\i1}Line one\\NLine two{\\i0}\n";
        let cues = parse_subtitles(ass, SubtitleFormat::Ass).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], SubtitleCue::new(1_000_000, 4_000_000, "Hello, world!"));
        assert_eq!(cues[1].start_micros, 5_500_000);
        assert_eq!(cues[1].text, "Line one\nLine two");
    }

    #[test]
    fn test_zero_length_cues_are_dropped() {
        let srt = "1\n00:00:02,000 --> 00:00:02,000\nempty\n\n2\n00:00:03,000 --> 00:00:01,000\nbackwards\n";
        assert!(parse_subtitles(srt, SubtitleFormat::Srt).unwrap().is_empty());
    }

    #[test]
    fn test_timestamp_forms() {
        assert_eq!(parse_timestamp("00:00:01,5"), Some(1_500_000));
        assert_eq!(parse_timestamp("1:02:03.04"), Some(3_723_040_000));
        assert_eq!(parse_timestamp("02:03.000"), Some(123_000_000));
        assert_eq!(parse_timestamp("00:61:00.000"), None);
        assert_eq!(parse_timestamp("garbage"), None);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SubtitleFormat::from_path(Path::new("a.SRT")), Some(SubtitleFormat::Srt));
        assert_eq!(SubtitleFormat::from_path(Path::new("a.vtt")), Some(SubtitleFormat::Vtt));
        assert_eq!(SubtitleFormat::from_path(Path::new("a.txt")), None);
    }
}
