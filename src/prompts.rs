/// System prompt sent once, alone, to seed the first assistant reply.
pub const CHAT_SYSTEM: &str = include_str!("../data/prompts/chat_system.txt");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_system_prompt() {
        assert_eq!(
            CHAT_SYSTEM,
            "You are a chatbot designed to assist users with their queries."
        );
    }
}
