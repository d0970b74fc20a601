//! Shutdown persistence: writes the two files described in spec §6.
//!
//! Grounded on the original bot's shutdown block (`bot.py` lines
//! 1176-1193): a human-readable `.txt` transcript and a full `.json` dump
//! written with `serde_json::to_writer_pretty`, one file set per call.

use copilot_core::{ParticipantId, Participant, Utterance};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ConversationLogError;

#[derive(serde::Serialize)]
struct PersistedContext<'a> {
    call_id: &'a str,
    participants: &'a HashMap<ParticipantId, Participant>,
    conversation_history: &'a [Utterance],
}

pub fn transcript_filename(call_id: &str, timestamp: &str) -> String {
    format!("call-transcript-{call_id}-{timestamp}.txt")
}

pub fn context_filename(call_id: &str, timestamp: &str) -> String {
    format!("call-context-{call_id}-{timestamp}.json")
}

/// Write the human-readable transcript, one line per utterance.
pub fn write_transcript(
    dir: &Path,
    call_id: &str,
    timestamp: &str,
    entries: &[Utterance],
    participants: &HashMap<ParticipantId, Participant>,
) -> Result<PathBuf, ConversationLogError> {
    let path = dir.join(transcript_filename(call_id, timestamp));
    let mut file = std::fs::File::create(&path)?;
    for entry in entries {
        let name = participants
            .get(&entry.speaker_id)
            .map(|p| p.display_name.as_str())
            .unwrap_or("Unknown");
        writeln!(
            file,
            "[{}] {} ({:?}): {}",
            entry.timestamp.to_rfc3339(),
            name,
            entry.channel,
            entry.text
        )?;
    }
    Ok(path)
}

/// Write the full JSON context dump (conversation log + participant map).
pub fn write_context(
    dir: &Path,
    call_id: &str,
    timestamp: &str,
    entries: &[Utterance],
    participants: &HashMap<ParticipantId, Participant>,
) -> Result<PathBuf, ConversationLogError> {
    let path = dir.join(context_filename(call_id, timestamp));
    let file = std::fs::File::create(&path)?;
    let context = PersistedContext {
        call_id,
        participants,
        conversation_history: entries,
    };
    serde_json::to_writer_pretty(file, &context)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_core::utterance::Channel;
    use tempfile::tempdir;

    #[test]
    fn writes_transcript_and_context_files() {
        let dir = tempdir().unwrap();
        let mut participants = HashMap::new();
        let id = ParticipantId::new("p1");
        participants.insert(id.clone(), Participant::new(id.clone(), "Alex"));
        let entries = vec![Utterance::new(id, "hello there", Channel::Passive)];

        let txt_path = write_transcript(dir.path(), "call-1", "ts", &entries, &participants).unwrap();
        let json_path = write_context(dir.path(), "call-1", "ts", &entries, &participants).unwrap();

        assert!(txt_path.exists());
        assert!(json_path.exists());
        let txt = std::fs::read_to_string(txt_path).unwrap();
        assert!(txt.contains("Alex"));
        assert!(txt.contains("hello there"));

        let json = std::fs::read_to_string(json_path).unwrap();
        assert!(json.contains("call-1"));
    }
}
