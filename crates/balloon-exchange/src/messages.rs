// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing texts.

pub const WELCOME: &str = "*Welcome to Balloon!* 🎈\n\n\
Write a message and let it fly: it will be delivered to the next person who \
writes one, and you will receive the message of the person before you.\n\n\
Add hashtags like #music or #paris to meet people who share them. Messages \
without hashtags go to everyone.";

pub const HELP: &str = "*How Balloon works* 🎈\n\n\
- Every message you send is delivered to the next person writing in the same hashtags.\n\
- In exchange you receive the previous message.\n\
- You can reply once to a message you received, within 24 hours.\n\
- If you liked a message, send the balloon back: its author gets one more balloon.\n\
- You have a few balloons; they refill over time.";

pub const NEW_FIRST: &str = "Ok! Enter your first message. Remember you can use hashtags.";
pub const NEW_AGAIN: &str = "Ok! Enter your new message. Remember you can use hashtags.";
pub const TYPE_REPLY: &str = "Type your reply :";

pub const NO_MESSAGE_EVER: &str = "Thanks for your message! You are the first one to write \
in these hashtags, so there is nothing for you yet. Your message will be delivered to the \
next person.";

pub const YOU_AGAIN: &str = "Thanks for your message! The last message in these hashtags \
was yours, so there is nothing new for you yet. Your message will be delivered to the next \
person.";

pub const NO_MORE: &str = "You have no balloons left 😢 They refill over time, come back a \
little later!";

pub const FIRST_SEND_HINT: &str = "Tip: when you receive a message, you can reply to it \
once, or send the balloon back to its author if you liked it.";

pub const REPLY_SENT: &str = "Your reply has been delivered!";
pub const REPLY_ALREADY: &str = "You already replied to this message.";
pub const REPLY_EXPIRED: &str = "Sorry, this message is too old to reply to.";
pub const NOT_FOUND: &str = "Sorry, this message can't be found.";

pub const SENT_BACK: &str = "The balloon has been sent back! Thanks!";
pub const SENT_BACK_ALREADY: &str = "You already sent this balloon back.";

pub const TRENDING_HEADER: &str = "Here are the trending hashtags:";
pub const TRENDING_EMPTY: &str = "Nothing is trending yet. Start something with a hashtag!";

pub const BUTTON_FIRST: &str = "Write my first message";
pub const BUTTON_NEW: &str = "Write a new message";
pub const BUTTON_TRENDING: &str = "Trending";
pub const BUTTON_REPLY: &str = "Reply";
pub const BUTTON_SEND_BACK: &str = "Send back";
pub const BUTTON_HELP: &str = "Help";

pub fn status(credits: u32) -> String {
    format!("(You have {credits} 🎈 left!)")
}

pub fn message_intro(display_name: &str) -> String {
    format!(
        "Thanks for your message! It will be delivered to the next person. \
         Here is a message from {display_name}:"
    )
}

pub fn reply_intro(display_name: &str) -> String {
    format!("{display_name} replied to your message!")
}

pub fn too_short(min: usize) -> String {
    format!(
        "Your message is too short. Please write at least {min} characters \
         (hashtags count too)."
    )
}

pub fn unknown_command(text: &str) -> String {
    format!("Unknown command\n\n`{text}`")
}
