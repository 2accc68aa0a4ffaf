use crate::error::LayoutError;
use crate::layout::collection::RunCollection;
use crate::layout::composed_line::ComposedLine;
use crate::layout::line_resolver::TruncationPlace;
use crate::layout::typesetter::Typesetter;
use crate::style::SpanList;

const ELLIPSIS: char = '\u{2026}';

/// Build the pre-shaped truncation token line for a truncated range.
///
/// The token takes the typeface and size in effect at the boundary the
/// truncation happens at: the range start for start truncation, the range
/// end otherwise. Without an explicit token string, an ellipsis character
/// is used when the typeface maps one, three dots otherwise.
pub(crate) fn create_token(
    runs: &RunCollection,
    char_start: usize,
    char_end: usize,
    place: TruncationPlace,
    token_str: Option<&str>,
) -> Result<ComposedLine, LayoutError> {
    let truncation_index = match place {
        TruncationPlace::Start => char_start,
        TruncationPlace::Middle | TruncationPlace::End => char_end - 1,
    };

    let run_index = runs
        .binary_search(truncation_index)
        .ok_or(LayoutError::InvalidRange {
            range: char_start..char_end,
            len: 0,
        })?;
    let boundary_run = runs.get(run_index);

    let typeface = boundary_run.typeface().clone();
    let type_size = boundary_run.type_size();

    let token_text = match token_str {
        Some(token) => token.to_string(),
        None => {
            if typeface.glyph_id(ELLIPSIS) != 0 {
                ELLIPSIS.to_string()
            } else {
                "...".to_string()
            }
        }
    };

    let spans = SpanList::with_defaults(typeface, type_size);
    let typesetter = Typesetter::new(token_text, spans)?;
    typesetter.create_simple_line(0, typesetter.char_count())
}
