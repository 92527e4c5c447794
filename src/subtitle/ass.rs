//! Формирование документа ASS: заголовок, стиль и строки событий

use std::fmt::Write as _;

use crate::config::SubtitleStyle;

/// Имя единственного стиля документа
pub const DEFAULT_STYLE_NAME: &str = "Default";

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENTS_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Переводит секунды в формат времени ASS `H:MM:SS.cc`.
///
/// Считается от общего числа сотых долей, поэтому 59.999 c превращается в `0:01:00.00`.
pub fn format_ass_time(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;
    let cs = total_cs % 100;
    let total_secs = total_cs / 100;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;
    format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, cs)
}

fn ass_bool(value: bool) -> i8 {
    if value {
        1
    } else {
        0
    }
}

/// Строка `Style:` для заданного стиля
pub fn style_line(style: &SubtitleStyle) -> String {
    format!(
        "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        DEFAULT_STYLE_NAME,
        style.font_name,
        style.font_size,
        style.primary_colour,
        style.secondary_colour,
        style.outline_colour,
        style.back_colour,
        ass_bool(style.bold),
        ass_bool(style.italic),
        style.border_style,
        style.outline,
        style.shadow,
        style.alignment,
        style.margin_l,
        style.margin_r,
        style.margin_v,
        style.encoding,
    )
}

/// Заголовок документа вплоть до строки формата событий
pub fn header(style: &SubtitleStyle, play_res: (u32, u32)) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[Script Info]");
    let _ = writeln!(out, "ScriptType: v4.00+");
    let _ = writeln!(out, "PlayResX: {}", play_res.0);
    let _ = writeln!(out, "PlayResY: {}", play_res.1);
    let _ = writeln!(out);
    let _ = writeln!(out, "[V4+ Styles]");
    let _ = writeln!(out, "{}", STYLE_FORMAT);
    let _ = writeln!(out, "{}", style_line(style));
    let _ = writeln!(out);
    let _ = writeln!(out, "[Events]");
    let _ = write!(out, "{}", EVENTS_FORMAT);
    out
}

/// Строка события `Dialogue:`
pub fn dialogue_line(start: f64, end: f64, text: &str) -> String {
    format!(
        "Dialogue: 0,{},{},{},,0,0,0,,{}",
        format_ass_time(start),
        format_ass_time(end),
        DEFAULT_STYLE_NAME,
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(1.5), "0:00:01.50");
        assert_eq!(format_ass_time(61.234), "0:01:01.23");
        assert_eq!(format_ass_time(3725.5), "1:02:05.50");
        assert_eq!(format_ass_time(59.999), "0:01:00.00");
        assert_eq!(format_ass_time(-3.0), "0:00:00.00");
    }

    #[test]
    fn test_default_style_line() {
        assert_eq!(
            style_line(&SubtitleStyle::default()),
            "Style: Default,Arial,125,&H00FFFFFF,&H00FF0000,&H00000000,&H00000000,1,0,1,3,0,2,10,10,850,1"
        );
    }

    #[test]
    fn test_header_uses_play_resolution() {
        let header = header(&SubtitleStyle::default(), (720, 1280));
        assert!(header.starts_with("[Script Info]\nScriptType: v4.00+\nPlayResX: 720\nPlayResY: 1280\n"));
        assert!(header.contains("[V4+ Styles]"));
        assert!(header.ends_with(EVENTS_FORMAT));
    }

    #[test]
    fn test_dialogue_line() {
        assert_eq!(
            dialogue_line(0.0, 1.5, "{\\k40}hi"),
            "Dialogue: 0,0:00:00.00,0:00:01.50,Default,,0,0,0,,{\\k40}hi"
        );
    }
}
