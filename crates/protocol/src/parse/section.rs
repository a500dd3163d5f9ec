//! Tool-section grammar
//!
//! ```text
//! text<|tool_calls_section_begin|>
//! <|tool_call_begin|>functions.get_weather:0<|tool_call_argument_begin|>{…}<|tool_call_end|>
//! <|tool_calls_section_end|>
//! ```
//!
//! Text outside the section follows the markup grammar.

use super::{
    Call, Emitter, earliest,
    markup::{Markup, Stop},
};
use crate::labels::{LabelRegistry, SectionTags};
use compact_str::CompactString;
use pcore::{SegmentKind, SegmentState};

pub(crate) fn parse(
    buffer: &str,
    tags: SectionTags,
    registry: &LabelRegistry,
    out: &mut Emitter<'_>,
) {
    let markup = Markup::new(registry).with_section(tags);
    let mut rest = buffer;
    loop {
        let Stop::Section(start) = markup.parse(rest, out) else {
            return;
        };
        match calls(&rest[start..], tags, out) {
            Some(after) => rest = after,
            None => return,
        }
    }
}

/// Parse one section, returning the text after its end
fn calls<'b>(section: &'b str, tags: SectionTags, out: &mut Emitter<'_>) -> Option<&'b str> {
    let mut section = section.strip_prefix(tags.begin).unwrap_or(section);
    loop {
        let rest = section.trim_start();
        if let Some(after) = rest.strip_prefix(tags.end) {
            return Some(after);
        }

        let Some(call) = rest.strip_prefix(tags.call_begin) else {
            // stray text inside the section
            match earliest(rest, &[tags.call_begin, tags.end]) {
                Some((idx, _)) => {
                    out.text(SegmentKind::Final, rest[..idx].trim(), SegmentState::Closed);
                    section = &rest[idx..];
                    continue;
                }
                None => {
                    let text = out.hold_back(rest);
                    out.text(SegmentKind::Final, text.trim(), SegmentState::Truncated);
                    return None;
                }
            }
        };

        // the id must be complete before the call is emitted
        let id_len = call.find(tags.argument_begin)?;
        let id = call[..id_len].trim();
        let arguments = &call[id_len + tags.argument_begin.len()..];

        match arguments.find(tags.call_end) {
            Some(end) => {
                let content = arguments[..end].trim();
                out.tool(
                    content,
                    SegmentState::Closed,
                    Some(Call {
                        recipient: recipient(id),
                        arguments: content.to_owned(),
                        id: Some(id.into()),
                    }),
                );
                section = &arguments[end + tags.call_end.len()..];
            }
            None => {
                let content = out.hold_back(arguments);
                out.tool(content.trim(), SegmentState::Truncated, None);
                return None;
            }
        }
    }
}

/// `functions.get_weather:0` names `get_weather`
fn recipient(id: &str) -> CompactString {
    let name = id.strip_prefix("functions.").unwrap_or(id);
    let name = match name.rsplit_once(':') {
        Some((name, index)) if index.chars().all(|c| c.is_ascii_digit()) => name,
        _ => name,
    };
    name.into()
}

#[cfg(test)]
mod tests {
    use super::recipient;

    #[test]
    fn recipient_strips_namespace_and_index() {
        assert_eq!(recipient("functions.get_weather:0"), "get_weather");
        assert_eq!(recipient("search:12"), "search");
        assert_eq!(recipient("functions.lookup"), "lookup");
    }
}
