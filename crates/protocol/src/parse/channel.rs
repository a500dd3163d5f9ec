//! Tag-channel grammar
//!
//! ```text
//! <|channel|>analysis<|message|>…<|end|>
//! <|start|>assistant<|channel|>commentary to=functions.x <|constrain|>json<|message|>{…}<|call|>
//! <|start|>assistant<|channel|>final<|message|>…<|return|>
//! ```

use super::{Call, Emitter, earliest};
use crate::labels::ChannelTags;
use pcore::{SegmentKind, SegmentState};

/// Namespace prefix stripped from function recipients
const FUNCTIONS: &str = "functions.";

pub(crate) fn parse(buffer: &str, tags: ChannelTags, out: &mut Emitter<'_>) {
    let openers = [tags.start, tags.channel];
    let terminators = [tags.end, tags.call, tags.ret, tags.start, tags.channel];

    let mut cursor = 0;
    while cursor <= buffer.len() {
        let rest = &buffer[cursor..];
        let Some((open, _)) = earliest(rest, &openers) else {
            let loose = out.hold_back(rest);
            out.text(SegmentKind::Final, loose.trim(), SegmentState::Truncated);
            return;
        };
        out.text(SegmentKind::Final, rest[..open].trim(), SegmentState::Closed);

        // nothing is emitted until the header is complete
        let Some(header_len) = rest[open..].find(tags.message) else {
            return;
        };
        let header = Header::read(&rest[open..open + header_len], &tags);
        let body_start = open + header_len + tags.message.len();
        let body = &rest[body_start..];

        match earliest(body, &terminators) {
            Some((end, terminator)) => {
                let called = terminator == tags.call;
                header.emit(&body[..end], SegmentState::Closed, called, out);

                // a new header ends the message without being consumed
                let consumed = if terminator == tags.start || terminator == tags.channel {
                    0
                } else {
                    terminator.len()
                };
                cursor += body_start + end + consumed;
            }
            None => {
                let content = out.hold_back(body);
                header.emit(content, SegmentState::Truncated, false, out);
                return;
            }
        }
    }
}

/// What a message header says about its body
struct Header<'h> {
    channel: Option<&'h str>,
    recipient: Option<&'h str>,
}

impl<'h> Header<'h> {
    fn read(header: &'h str, tags: &ChannelTags) -> Self {
        let channel = header
            .find(tags.channel)
            .map(|idx| word(&header[idx + tags.channel.len()..]));
        let recipient = header
            .find(tags.recipient)
            .map(|idx| word(&header[idx + tags.recipient.len()..]))
            .filter(|recipient| !recipient.is_empty() && *recipient != "assistant");

        Self {
            channel: channel.filter(|channel| !channel.is_empty()),
            recipient,
        }
    }

    fn kind(&self) -> SegmentKind {
        match (self.channel, self.recipient) {
            (Some("final"), _) => SegmentKind::Final,
            (_, Some(_)) => SegmentKind::Tool,
            (Some("analysis"), None) => SegmentKind::Reasoning,
            (Some("commentary"), None) => SegmentKind::Commentary,
            _ => SegmentKind::Final,
        }
    }

    /// Bodies are kept verbatim
    fn emit(&self, body: &str, state: SegmentState, called: bool, out: &mut Emitter<'_>) {
        match (self.kind(), self.recipient) {
            (SegmentKind::Tool, Some(recipient)) => {
                let call = called.then(|| Call {
                    recipient: recipient.strip_prefix(FUNCTIONS).unwrap_or(recipient).into(),
                    arguments: body.to_owned(),
                    id: None,
                });
                out.tool(body, state, call);
            }
            (kind, _) => out.text(kind, body, state),
        }
    }
}

/// Leading run up to whitespace or the next tag
fn word(text: &str) -> &str {
    let end = text
        .find(|c: char| c.is_whitespace() || c == '<')
        .unwrap_or(text.len());
    &text[..end]
}
