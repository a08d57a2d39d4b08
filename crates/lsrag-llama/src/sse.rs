//! Server-sent event decoding for agent turns

use std::collections::VecDeque;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use lsrag_core::{Error, Result, TurnEvent, TurnStream};
use serde_json::Value;

/// Decode one line of a turn response
///
/// Returns `None` for lines that carry no event (comments, blank keep-alives,
/// `[DONE]`, unparseable payloads).
pub fn parse_event_line(line: &str) -> Option<Result<TurnEvent>> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to parse response line: {} - Error: {}", data, e);
            return None;
        }
    };

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Some(Err(Error::GenerationFailure(message)));
    }

    let payload = value.pointer("/event/payload")?;
    let event_type = payload
        .get("event_type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let event = match event_type {
        "step_progress" => match payload.pointer("/delta/text").and_then(Value::as_str) {
            Some(text) => TurnEvent::Delta(text.to_string()),
            None => TurnEvent::Log(step_notice(event_type, payload)),
        },
        "turn_complete" => TurnEvent::Content(
            payload
                .pointer("/turn/output_message/content")
                .map(content_text)
                .unwrap_or_default(),
        ),
        _ => TurnEvent::Log(step_notice(event_type, payload)),
    };

    Some(Ok(event))
}

/// Message content is either a plain string or a list of typed items
fn content_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.as_str()),
                other => other.get("text").and_then(Value::as_str),
            })
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

fn step_notice(event_type: &str, payload: &Value) -> String {
    match payload.get("step_type").and_then(Value::as_str) {
        Some(step_type) => format!("{} ({})", event_type, step_type),
        None => event_type.to_string(),
    }
}

struct LineDecoder {
    body: BoxStream<'static, Result<Vec<u8>>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<TurnEvent>>,
    finished: bool,
}

impl LineDecoder {
    fn drain_complete_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.push_line(&line);
        }
    }

    fn push_line(&mut self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        if let Some(event) = parse_event_line(line.trim_end_matches(['\r', '\n'])) {
            self.pending.push_back(event);
        }
    }
}

/// Turn a byte stream of server-sent events into a stream of turn events
///
/// The stream ends after the first error.
pub fn decode_events(body: BoxStream<'static, Result<Vec<u8>>>) -> TurnStream {
    let decoder = LineDecoder {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        loop {
            if let Some(event) = decoder.pending.pop_front() {
                if event.is_err() {
                    decoder.pending.clear();
                    decoder.finished = true;
                }
                return Some((event, decoder));
            }
            if decoder.finished {
                return None;
            }
            match decoder.body.next().await {
                Some(Ok(chunk)) => {
                    decoder.buffer.extend_from_slice(&chunk);
                    decoder.drain_complete_lines();
                }
                Some(Err(e)) => {
                    decoder.finished = true;
                    decoder.pending.push_back(Err(e));
                }
                None => {
                    decoder.finished = true;
                    let rest = std::mem::take(&mut decoder.buffer);
                    if !rest.is_empty() {
                        decoder.push_line(&rest);
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&str]) -> BoxStream<'static, Result<Vec<u8>>> {
        let owned: Vec<Result<Vec<u8>>> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned).boxed()
    }

    #[test]
    fn test_parse_progress_delta() {
        let line = r#"data: {"event":{"payload":{"event_type":"step_progress","step_type":"inference","delta":{"type":"text","text":"Par"}}}}"#;
        let event = parse_event_line(line).unwrap().unwrap();
        assert_eq!(event, TurnEvent::Delta("Par".to_string()));
    }

    #[test]
    fn test_parse_turn_complete_with_item_list() {
        let line = r#"data: {"event":{"payload":{"event_type":"turn_complete","turn":{"output_message":{"role":"assistant","content":[{"type":"text","text":"Paris"},{"type":"text","text":"."}]}}}}}"#;
        let event = parse_event_line(line).unwrap().unwrap();
        assert_eq!(event, TurnEvent::Content("Paris.".to_string()));
    }

    #[test]
    fn test_parse_step_start_is_log() {
        let line = r#"data: {"event":{"payload":{"event_type":"step_start","step_type":"inference"}}}"#;
        let event = parse_event_line(line).unwrap().unwrap();
        assert_eq!(event, TurnEvent::Log("step_start (inference)".to_string()));
    }

    #[test]
    fn test_parse_error_payload() {
        let line = r#"data: {"error":{"message":"model not found"}}"#;
        let err = parse_event_line(line).unwrap().unwrap_err();
        assert!(matches!(err, Error::GenerationFailure(ref m) if m == "model not found"));
    }

    #[test]
    fn test_parse_ignores_non_events() {
        assert!(parse_event_line("").is_none());
        assert!(parse_event_line(": keep-alive").is_none());
        assert!(parse_event_line("data: [DONE]").is_none());
        assert!(parse_event_line("data: {not json").is_none());
    }

    #[tokio::test]
    async fn test_decode_events_across_chunk_boundaries() {
        let body = chunks(&[
            "data: {\"event\":{\"payload\":{\"event_type\":\"step_progress\",\"delta\":{\"text\":\"Pa\"}}}}\n\nda",
            "ta: {\"event\":{\"payload\":{\"event_type\":\"step_progress\",\"delta\":{\"text\":\"ris\"}}}}\n\n",
            "data: {\"event\":{\"payload\":{\"event_type\":\"turn_complete\",\"turn\":{\"output_message\":{\"content\":\"Paris\"}}}}}",
        ]);

        let events: Vec<TurnEvent> = decode_events(body)
            .map(|event| event.unwrap())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                TurnEvent::Delta("Pa".to_string()),
                TurnEvent::Delta("ris".to_string()),
                TurnEvent::Content("Paris".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_decode_events_stops_after_error() {
        let body = chunks(&[
            "data: {\"error\":{\"message\":\"boom\"}}\n",
            "data: {\"event\":{\"payload\":{\"event_type\":\"turn_complete\",\"turn\":{\"output_message\":{\"content\":\"late\"}}}}}\n",
        ]);

        let events: Vec<Result<TurnEvent>> = decode_events(body).collect().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }
}
