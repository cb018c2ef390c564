// ABOUTME: Typed decoding of image build/pull progress streams.
// ABOUTME: Logs progress, keeps error fragments as warnings, and ends only when the stream does.

use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::{ImageError, ProgressChunk, ProgressRecord, ProgressStream};
use crate::types::ImageId;
use futures::StreamExt;

/// Longest fragment excerpt kept when a fragment cannot be decoded.
const FRAGMENT_EXCERPT: usize = 120;

/// One decoded fragment of a build or pull stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Human-readable progress text.
    Progress(String),
    /// An error the engine reported inside the stream.
    Error(String),
    /// The id of the image a build produced.
    Built(ImageId),
    /// A record with nothing worth reporting.
    Empty,
    /// Text that is not a progress record.
    Malformed { fragment: String, reason: String },
}

impl ProgressEvent {
    /// Decode a chunk. Raw chunks may hold several newline-separated records.
    pub fn decode(chunk: ProgressChunk) -> Vec<ProgressEvent> {
        match chunk {
            ProgressChunk::Record(record) => vec![Self::from_record(record)],
            ProgressChunk::Raw(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(Self::from_line)
                    .collect()
            }
        }
    }

    fn from_line(line: &str) -> ProgressEvent {
        match serde_json::from_str::<ProgressRecord>(line) {
            Ok(record) => Self::from_record(record),
            Err(e) => ProgressEvent::Malformed {
                fragment: excerpt(line),
                reason: e.to_string(),
            },
        }
    }

    pub fn from_record(record: ProgressRecord) -> ProgressEvent {
        let detail = record.error_detail.and_then(|d| d.message);
        if let Some(message) = record.error.or(detail) {
            return ProgressEvent::Error(message.trim_end().to_string());
        }

        if let Some(id) = record.aux.and_then(|aux| aux.id) {
            return ProgressEvent::Built(ImageId::new(id));
        }

        if let Some(text) = record.stream {
            let text = text.trim_end();
            return if text.is_empty() {
                ProgressEvent::Empty
            } else {
                ProgressEvent::Progress(text.to_string())
            };
        }

        match record.status {
            Some(status) => {
                let mut line = match record.id {
                    Some(id) => format!("{}: {}", id, status),
                    None => status,
                };
                if let Some(progress) = record.progress {
                    line.push(' ');
                    line.push_str(&progress);
                }
                ProgressEvent::Progress(line)
            }
            None => ProgressEvent::Empty,
        }
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(FRAGMENT_EXCERPT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// What a drained stream reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    pub image: Option<ImageId>,
    pub messages: usize,
    pub errors: usize,
    pub malformed: usize,
}

/// Consume a progress stream to its end.
///
/// Error fragments and malformed fragments are recorded in `diagnostics` and
/// do not fail the stream; only an `Err` item does.
pub async fn drain(
    mut stream: ProgressStream<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<ProgressSummary, ImageError> {
    let mut summary = ProgressSummary::default();

    while let Some(item) = stream.next().await {
        for event in ProgressEvent::decode(item?) {
            match event {
                ProgressEvent::Progress(text) => {
                    tracing::info!("{}", text);
                    summary.messages += 1;
                }
                ProgressEvent::Error(message) => {
                    tracing::error!("{}", message);
                    diagnostics.record(Warning::progress_error(message));
                    summary.errors += 1;
                }
                ProgressEvent::Built(id) => {
                    tracing::debug!(image = %id.short(), "image built");
                    summary.image = Some(id);
                }
                ProgressEvent::Empty => {}
                ProgressEvent::Malformed { fragment, reason } => {
                    diagnostics.warn(Warning::malformed_progress(format!(
                        "skipped undecodable progress fragment {:?}: {}",
                        fragment, reason
                    )));
                    summary.malformed += 1;
                }
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::WarningKind;
    use crate::runtime::traits::{AuxId, ErrorDetail};
    use bytes::Bytes;
    use futures::stream;

    fn record(stream: &str) -> ProgressChunk {
        ProgressChunk::Record(ProgressRecord {
            stream: Some(stream.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn build_output_is_progress() {
        assert_eq!(
            ProgressEvent::decode(record("Step 1/3 : FROM node\n")),
            vec![ProgressEvent::Progress("Step 1/3 : FROM node".to_string())]
        );
    }

    #[test]
    fn blank_build_output_is_empty() {
        assert_eq!(
            ProgressEvent::decode(record("\n")),
            vec![ProgressEvent::Empty]
        );
    }

    #[test]
    fn pull_status_includes_layer_and_bar() {
        let chunk = ProgressChunk::Record(ProgressRecord {
            status: Some("Downloading".to_string()),
            id: Some("a1b2".to_string()),
            progress: Some("[=>   ]".to_string()),
            ..Default::default()
        });
        assert_eq!(
            ProgressEvent::decode(chunk),
            vec![ProgressEvent::Progress("a1b2: Downloading [=>   ]".to_string())]
        );
    }

    #[test]
    fn error_detail_is_an_error() {
        let chunk = ProgressChunk::Record(ProgressRecord {
            error_detail: Some(ErrorDetail {
                code: Some(1),
                message: Some("manifest unknown".to_string()),
            }),
            ..Default::default()
        });
        assert_eq!(
            ProgressEvent::decode(chunk),
            vec![ProgressEvent::Error("manifest unknown".to_string())]
        );
    }

    #[test]
    fn aux_id_is_the_built_image() {
        let chunk = ProgressChunk::Record(ProgressRecord {
            aux: Some(AuxId {
                id: Some("sha256:abc".to_string()),
            }),
            ..Default::default()
        });
        assert_eq!(
            ProgressEvent::decode(chunk),
            vec![ProgressEvent::Built(ImageId::new("sha256:abc"))]
        );
    }

    #[test]
    fn raw_chunk_splits_lines() {
        let chunk = ProgressChunk::Raw(Bytes::from_static(
            b"{\"stream\":\"one\"}\n{\"error\":\"two\"}\nnot json\n",
        ));
        let events = ProgressEvent::decode(chunk);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ProgressEvent::Progress("one".to_string()));
        assert_eq!(events[1], ProgressEvent::Error("two".to_string()));
        assert!(matches!(
            &events[2],
            ProgressEvent::Malformed { fragment, .. } if fragment == "not json"
        ));
    }

    #[test]
    fn long_fragments_are_cut() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert_eq!(cut.len(), FRAGMENT_EXCERPT + 3);
        assert!(cut.ends_with("..."));
    }

    #[tokio::test]
    async fn error_fragment_does_not_fail_the_stream() {
        let items: Vec<Result<ProgressChunk, ImageError>> = vec![
            Ok(record("Step 1/2")),
            Ok(ProgressChunk::Record(ProgressRecord {
                error: Some("COPY failed".to_string()),
                ..Default::default()
            })),
            Ok(ProgressChunk::Raw(Bytes::from_static(b"{oops"))),
            Ok(record("Step 2/2")),
        ];
        let mut diagnostics = Diagnostics::default();

        let summary = drain(Box::pin(stream::iter(items)), &mut diagnostics)
            .await
            .unwrap();

        assert_eq!(summary.messages, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(diagnostics.count(WarningKind::ProgressError), 1);
        assert_eq!(diagnostics.count(WarningKind::MalformedProgress), 1);
    }

    #[tokio::test]
    async fn transport_error_fails_the_stream() {
        let items: Vec<Result<ProgressChunk, ImageError>> = vec![
            Ok(record("Step 1/2")),
            Err(ImageError::BuildFailed("connection reset".to_string())),
            Ok(record("never seen")),
        ];
        let mut diagnostics = Diagnostics::default();

        let err = drain(Box::pin(stream::iter(items)), &mut diagnostics)
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::BuildFailed(_)));
    }
}
