use core::ops::Range;

use unicode_script::{Script, UnicodeScript};

use crate::shaping::Direction;

/// A maximal character range sharing one Unicode script.
#[derive(Debug, Clone)]
pub struct ScriptRun {
    pub char_range: Range<usize>,
    pub script: Script,
}

/// Itemize a character range into script runs.
///
/// Characters classified as Common, Inherited or Unknown do not start a run
/// of their own: they continue the preceding concrete script, or attach to
/// the following one at the start of the range.
pub fn script_runs(chars: &[char], range: Range<usize>) -> Vec<ScriptRun> {
    let mut runs: Vec<ScriptRun> = Vec::new();
    let mut run_start = range.start;
    let mut current: Option<Script> = None;

    for index in range.clone() {
        let script = chars[index].script();
        if is_neutral(script) {
            continue;
        }

        match current {
            None => current = Some(script),
            Some(active) if active == script => {}
            Some(active) => {
                runs.push(ScriptRun {
                    char_range: run_start..index,
                    script: active,
                });
                run_start = index;
                current = Some(script);
            }
        }
    }

    if run_start < range.end {
        runs.push(ScriptRun {
            char_range: run_start..range.end,
            script: current.unwrap_or(Script::Latin),
        });
    }

    runs
}

fn is_neutral(script: Script) -> bool {
    matches!(
        script,
        Script::Common | Script::Inherited | Script::Unknown
    )
}

/// Natural writing direction of a script.
pub fn script_direction(script: Script) -> Direction {
    match script {
        Script::Arabic
        | Script::Hebrew
        | Script::Syriac
        | Script::Thaana
        | Script::Nko
        | Script::Samaritan
        | Script::Mandaic
        | Script::Adlam
        | Script::Hanifi_Rohingya
        | Script::Yezidi => Direction::RightToLeft,
        _ => Direction::LeftToRight,
    }
}

/// ISO 15924 tag bytes for a script, suitable for the shaping engine.
pub fn script_tag(script: Script) -> [u8; 4] {
    let mut tag = [b' '; 4];
    for (slot, byte) in tag.iter_mut().zip(script.short_name().bytes()) {
        *slot = byte;
    }
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars_of(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn single_script_yields_one_run() {
        let chars = chars_of("hello");
        let runs = script_runs(&chars, 0..5);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].char_range, 0..5);
        assert_eq!(runs[0].script, Script::Latin);
    }

    #[test]
    fn common_characters_join_adjacent_script() {
        let chars = chars_of("abc, אבג");
        let runs = script_runs(&chars, 0..8);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].script, Script::Latin);
        // ", " stays with the Latin run.
        assert_eq!(runs[0].char_range, 0..5);
        assert_eq!(runs[1].script, Script::Hebrew);
    }

    #[test]
    fn leading_common_attaches_to_first_concrete_script() {
        let chars = chars_of("123 אבג");
        let runs = script_runs(&chars, 0..7);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].script, Script::Hebrew);
    }

    #[test]
    fn direction_of_common_scripts() {
        assert_eq!(script_direction(Script::Latin), Direction::LeftToRight);
        assert_eq!(script_direction(Script::Arabic), Direction::RightToLeft);
        assert_eq!(script_direction(Script::Hebrew), Direction::RightToLeft);
        assert_eq!(script_direction(Script::Han), Direction::LeftToRight);
    }

    #[test]
    fn tags_are_iso15924() {
        assert_eq!(&script_tag(Script::Latin), b"Latn");
        assert_eq!(&script_tag(Script::Arabic), b"Arab");
    }
}
