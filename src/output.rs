//! Console messages for the binary (template creation, startup failures,
//! shutdown notice). Everything the service does while running goes through
//! `tracing` instead.

use owo_colors::{AnsiColors, OwoColorize};

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn is_tty(self) -> bool {
        match self {
            Stream::Stdout => atty::is(atty::Stream::Stdout),
            Stream::Stderr => atty::is(atty::Stream::Stderr),
        }
    }
}

fn render(tag: &str, color: AnsiColors, msg: &str, colored: bool) -> String {
    if colored {
        format!("{} {}", tag.color(color).bold(), msg)
    } else {
        format!("{tag} {msg}")
    }
}

fn print_tagged(stream: Stream, tag: &str, color: AnsiColors, msg: &str) {
    let line = render(tag, color, msg, stream.is_tty());
    match stream {
        Stream::Stdout => println!("{line}"),
        Stream::Stderr => eprintln!("{line}"),
    }
}

pub fn print_info(msg: &str) {
    print_tagged(Stream::Stdout, "info:", AnsiColors::Cyan, msg);
}

pub fn print_success(msg: &str) {
    print_tagged(Stream::Stdout, "ok:", AnsiColors::Green, msg);
}

pub fn print_warn(msg: &str) {
    print_tagged(Stream::Stderr, "warn:", AnsiColors::Yellow, msg);
}

pub fn print_error(msg: &str) {
    print_tagged(Stream::Stderr, "error:", AnsiColors::Red, msg);
}
