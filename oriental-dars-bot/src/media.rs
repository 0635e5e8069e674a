use teloxide::types::Message;

/// The file attachment of an incoming message, reduced to what the lesson
/// store keeps: the platform file handle plus optional name and size.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IncomingFile {
    pub file_id: String,
    pub file_name: Option<String>,
    pub file_size: i64,
}

/// Extract a storable file reference from a message. Accepts the same
/// attachment kinds the admin upload flow accepts: documents, audio, video,
/// voice and video notes.
pub fn extract_file(message: &Message) -> Option<IncomingFile> {
    if let Some(document) = message.document() {
        return Some(IncomingFile {
            file_id: document.file_id.clone(),
            file_name: document.file_name.clone(),
            file_size: i64::from(document.file_size),
        });
    }
    if let Some(audio) = message.audio() {
        return Some(IncomingFile {
            file_id: audio.file_id.clone(),
            file_name: audio.title.clone().or_else(|| Some(String::from("audio"))),
            file_size: i64::from(audio.file_size),
        });
    }
    if let Some(video) = message.video() {
        return Some(IncomingFile {
            file_id: video.file_id.clone(),
            file_name: Some(String::from("video")),
            file_size: i64::from(video.file_size),
        });
    }
    if let Some(voice) = message.voice() {
        return Some(IncomingFile {
            file_id: voice.file_id.clone(),
            file_name: Some(String::from("voice")),
            file_size: i64::from(voice.file_size),
        });
    }
    if let Some(video_note) = message.video_note() {
        return Some(IncomingFile {
            file_id: video_note.file_id.clone(),
            file_name: Some(String::from("video_note")),
            file_size: i64::from(video_note.file_size),
        });
    }
    None
}
