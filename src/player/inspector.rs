use std::fmt;

use crate::pipeline::{PipelineFacade, StreamKind};

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEntry {
    Video {
        index: u32,
        codec: String,
    },
    /// Absent tags are left out of the entry.
    Audio {
        index: u32,
        codec: Option<String>,
        language: Option<String>,
        bitrate: Option<u32>,
    },
    Subtitle {
        index: u32,
        language: String,
    },
}

impl StreamEntry {
    pub fn kind(&self) -> StreamKind {
        match self {
            StreamEntry::Video { .. } => StreamKind::Video,
            StreamEntry::Audio { .. } => StreamKind::Audio,
            StreamEntry::Subtitle { .. } => StreamKind::Subtitle,
        }
    }
}

impl fmt::Display for StreamEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEntry::Video { index, codec } => {
                writeln!(f, "video stream {}:", index)?;
                writeln!(f, "  codec: {}", codec)
            }
            StreamEntry::Audio {
                index,
                codec,
                language,
                bitrate,
            } => {
                writeln!(f, "audio stream {}:", index)?;
                if let Some(codec) = codec {
                    writeln!(f, "  codec: {}", codec)?;
                }
                if let Some(language) = language {
                    writeln!(f, "  language: {}", language)?;
                }
                if let Some(bitrate) = bitrate {
                    writeln!(f, "  bitrate: {}", bitrate)?;
                }
                Ok(())
            }
            StreamEntry::Subtitle { index, language } => {
                writeln!(f, "subtitle stream {}:", index)?;
                writeln!(f, "  language: {}", language)
            }
        }
    }
}

/// Everything the engine knows about the streams of the current media, in
/// video, audio, subtitle order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamReport {
    pub entries: Vec<StreamEntry>,
}

impl StreamReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: StreamKind) -> usize {
        self.entries.iter().filter(|e| e.kind() == kind).count()
    }
}

impl fmt::Display for StreamReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            // Blank line between the video, audio and subtitle groups
            if i > 0 && self.entries[i - 1].kind() != entry.kind() {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

pub struct StreamInspector;

impl StreamInspector {
    /// Zero streams gives an empty report.
    pub fn inspect<P: PipelineFacade + ?Sized>(pipeline: &P) -> StreamReport {
        let counts = pipeline.query_stream_counts();
        log::debug!(
            "{} video stream(s), {} audio stream(s), {} subtitle stream(s)",
            counts.video,
            counts.audio,
            counts.subtitle
        );

        let mut entries = Vec::new();
        for kind in [StreamKind::Video, StreamKind::Audio, StreamKind::Subtitle] {
            for index in 0..counts.of(kind) {
                let tags = pipeline.query_stream_tags(kind, index).unwrap_or_default();
                entries.push(match kind {
                    StreamKind::Video => StreamEntry::Video {
                        index,
                        codec: tags.codec.unwrap_or_else(|| UNKNOWN.to_string()),
                    },
                    StreamKind::Audio => StreamEntry::Audio {
                        index,
                        codec: tags.codec,
                        language: tags.language,
                        bitrate: tags.bitrate,
                    },
                    StreamKind::Subtitle => StreamEntry::Subtitle {
                        index,
                        language: tags.language.unwrap_or_else(|| UNKNOWN.to_string()),
                    },
                });
            }
        }

        StreamReport { entries }
    }
}
