//! Message log — the append-only chat transcript.

use super::model::Message;

/// Ordered chat transcript. Insertion order is display order; entries are
/// never removed or deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the transcript.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut log = MessageLog::new();
        let contents: Vec<String> = (0..20).map(|i| format!("bericht {i}")).collect();
        for (i, content) in contents.iter().enumerate() {
            if i % 2 == 0 {
                log.add_message(Message::system(content.clone()));
            } else {
                log.add_message(Message::user(content.clone()));
            }
        }

        let read: Vec<&str> = log.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(read, contents.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(log.messages().len(), 20);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut log = MessageLog::new();
        log.add_message(Message::system("In welke branche ben je actief?"));
        log.add_message(Message::system("In welke branche ben je actief?"));
        assert_eq!(log.messages().len(), 2);
        assert_ne!(log.messages()[0].id, log.messages()[1].id);
    }

    #[test]
    fn empty_log() {
        let log = MessageLog::new();
        assert!(log.messages().is_empty());
    }
}
